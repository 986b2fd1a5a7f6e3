//! The tabular data block of a saveframe.
//!
//! A [`Loop`] holds a shared category, an ordered set of column names
//! (unique, case-insensitively) and row-major data. Every row always has
//! exactly as many values as there are columns; all mutating operations
//! either preserve that invariant or fail without touching the loop.

use std::fmt;

use crate::options::StarOptions;
use crate::quote::{quote_value, split_tag, QuotedValue};
use crate::{Error, Result};

/// A loop: declared columns plus row-major text values.
///
/// # Examples
///
/// ```rust
/// use nmrstar::Loop;
///
/// let mut lp = Loop::from_scratch();
/// lp.add_columns(&["_Sample.ID", "_Sample.Name"]).unwrap();
/// lp.add_data(vec!["1".into(), "lysozyme".into(), "2".into(), "ubiquitin".into()]).unwrap();
/// assert_eq!(lp.rows().len(), 2);
/// assert_eq!(lp.category(), Some("_Sample"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Loop {
    category: Option<String>,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Loop {
    /// Creates an empty loop with no category, columns or data.
    #[must_use]
    pub fn from_scratch() -> Self {
        Loop::default()
    }

    /// Creates a loop with the category and columns of `source` and no data.
    #[must_use]
    pub fn from_template(source: &Loop) -> Self {
        Loop {
            category: source.category.clone(),
            columns: source.columns.clone(),
            rows: Vec::new(),
        }
    }

    /// The loop's category (shared column prefix), with its leading
    /// underscore.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Sets the category. A missing leading underscore is added.
    pub fn set_category(&mut self, category: &str) {
        self.category = Some(normalize_category(category));
    }

    /// The bare column names, in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The data rows. Every row has `columns().len()` values.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Vec<String>] {
        &mut self.rows
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// `true` when the loop holds no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Declares one column, by bare or qualified name.
    ///
    /// A qualified name fixes the loop's category on first use and must
    /// match it afterwards. Columns cannot be added once data rows exist.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyExists`] for a duplicate name (case-insensitive),
    /// [`Error::Structural`] for a category mismatch, an empty name, or a
    /// loop that already holds data.
    pub fn add_column(&mut self, name: &str) -> Result<()> {
        if !self.rows.is_empty() {
            return Err(Error::structural(
                "cannot declare columns once a loop holds data",
            ));
        }
        let (prefix, bare) = split_tag(name);
        self.check_category(prefix)?;
        if bare.is_empty() {
            return Err(Error::structural(format!("invalid column name '{}'", name)));
        }
        if self.find_column(bare).is_some() {
            return Err(Error::already_exists(bare));
        }
        if self.category.is_none() {
            if let Some(prefix) = prefix {
                self.category = Some(normalize_category(prefix));
            }
        }
        self.columns.push(bare.to_string());
        Ok(())
    }

    /// Declares several columns atomically: either every name is valid and
    /// all are added, or the loop is left untouched.
    pub fn add_columns<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        let mut trial = self.clone();
        for name in names {
            trial.add_column(name.as_ref())?;
        }
        *self = trial;
        Ok(())
    }

    /// Appends one data row; its width must equal the column count.
    pub fn add_row(&mut self, row: Vec<String>) -> Result<()> {
        if self.columns.is_empty() {
            return Err(Error::structural("cannot add data to a loop with no columns"));
        }
        if row.len() != self.columns.len() {
            return Err(Error::structural(format!(
                "row width {} does not match column count {}",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Appends a flat list of values, rearranging it into rows of the
    /// declared column width.
    ///
    /// # Errors
    ///
    /// [`Error::Structural`] when no columns are declared or the list length
    /// is not a multiple of the column count; nothing is added on failure.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nmrstar::Loop;
    ///
    /// let mut lp = Loop::from_scratch();
    /// lp.add_columns(&["_T.A", "_T.B", "_T.C"]).unwrap();
    /// lp.add_data((1..=6).map(|n| n.to_string()).collect()).unwrap();
    /// assert_eq!(lp.rows()[1], vec!["4", "5", "6"]);
    /// ```
    pub fn add_data(&mut self, flat: Vec<String>) -> Result<()> {
        if self.columns.is_empty() {
            return Err(Error::structural("cannot add data to a loop with no columns"));
        }
        let width = self.columns.len();
        if flat.len() % width != 0 {
            return Err(Error::structural(format!(
                "{} values cannot fill rows of width {}",
                flat.len(),
                width
            )));
        }
        let mut flat = flat;
        while !flat.is_empty() {
            let rest = flat.split_off(width);
            self.rows.push(flat);
            flat = rest;
        }
        Ok(())
    }

    /// Removes all data rows, keeping columns and category.
    pub fn clear_data(&mut self) {
        self.rows.clear();
    }

    /// Removes the named columns and their data, atomically: if any name
    /// fails to resolve, nothing is removed.
    pub fn remove_columns<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        let mut indices = Vec::with_capacity(names.len());
        for name in names {
            let idx = self.column_index(name.as_ref())?;
            if indices.contains(&idx) {
                return Err(Error::structural(format!(
                    "column '{}' listed more than once",
                    name.as_ref()
                )));
            }
            indices.push(idx);
        }
        indices.sort_unstable_by(|a, b| b.cmp(a));
        for idx in indices {
            self.columns.remove(idx);
            for row in &mut self.rows {
                row.remove(idx);
            }
        }
        Ok(())
    }

    /// Removes every row whose value in `column` equals `value`; returns the
    /// number of rows removed.
    pub fn remove_rows_where(&mut self, column: &str, value: &str) -> Result<usize> {
        let idx = self.column_index(column)?;
        let before = self.rows.len();
        self.rows.retain(|row| row[idx] != value);
        Ok(before - self.rows.len())
    }

    /// Returns a copy of one column's values, in row order.
    pub fn get_column(&self, name: &str) -> Result<Vec<String>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| row[idx].clone()).collect())
    }

    /// Rewrites an identifier column.
    ///
    /// With `maintain_ordering` unset, values become `start_value`,
    /// `start_value + 1`, … in current row order. With it set, every value is
    /// shifted by a constant so that the first row carries `start_value` and
    /// relative order (including duplicate runs) is preserved; any
    /// non-numeric value fails the call before anything is written.
    pub fn renumber_rows(
        &mut self,
        column: &str,
        start_value: i64,
        maintain_ordering: bool,
    ) -> Result<()> {
        let idx = self.column_index(column)?;
        if self.rows.is_empty() {
            return Ok(());
        }
        let renumbered: Vec<String> = if maintain_ordering {
            let parse = |raw: &str| -> Result<i64> {
                raw.trim().parse().map_err(|_| {
                    Error::structural(format!(
                        "cannot renumber column '{}': value '{}' is not numeric",
                        column, raw
                    ))
                })
            };
            let offset = start_value - parse(&self.rows[0][idx])?;
            let mut out = Vec::with_capacity(self.rows.len());
            for row in &self.rows {
                out.push((parse(&row[idx])? + offset).to_string());
            }
            out
        } else {
            (0..self.rows.len() as i64)
                .map(|n| (start_value + n).to_string())
                .collect()
        };
        for (row, value) in self.rows.iter_mut().zip(renumbered) {
            row[idx] = value;
        }
        Ok(())
    }

    /// Sorts the data rows by the listed columns.
    ///
    /// Each column sorts numerically when every one of its values parses as
    /// a number, lexically otherwise. One stable sort runs per listed
    /// column, so later columns take higher priority.
    pub fn sort_rows<S: AsRef<str>>(&mut self, columns: &[S]) -> Result<()> {
        let mut indices = Vec::with_capacity(columns.len());
        for column in columns {
            indices.push(self.column_index(column.as_ref())?);
        }
        for idx in indices {
            let numeric = self
                .rows
                .iter()
                .all(|row| row[idx].trim().parse::<f64>().is_ok());
            self.rows.sort_by(|a, b| {
                if numeric {
                    let left = a[idx].trim().parse::<f64>().unwrap_or(f64::NAN);
                    let right = b[idx].trim().parse::<f64>().unwrap_or(f64::NAN);
                    left.total_cmp(&right)
                } else {
                    a[idx].cmp(&b[idx])
                }
            });
        }
        Ok(())
    }

    /// Builds a new loop holding only the named columns and their data, in
    /// the order requested, preserving row order.
    ///
    /// Missing columns are an error unless `ignore_missing` is set; a
    /// qualified name with the wrong category is always an error.
    pub fn filter<S: AsRef<str>>(&self, columns: &[S], ignore_missing: bool) -> Result<Loop> {
        let mut picked = Vec::new();
        for name in columns {
            let (prefix, bare) = split_tag(name.as_ref());
            self.check_category(prefix)?;
            match self.find_column(bare) {
                Some(idx) if picked.contains(&idx) => {
                    return Err(Error::already_exists(bare));
                }
                Some(idx) => picked.push(idx),
                None if ignore_missing => {}
                None => {
                    return Err(Error::structural(format!(
                        "unknown column '{}' in loop '{}'",
                        name.as_ref(),
                        self.category.as_deref().unwrap_or("?")
                    )));
                }
            }
        }
        Ok(Loop {
            category: self.category.clone(),
            columns: picked.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| picked.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        })
    }

    /// Structural diff against another loop, as human-readable strings.
    ///
    /// Row data is first compared in order; when that fails, an
    /// order-insensitive comparison of sorted rows decides, since row order
    /// is not always semantically significant.
    pub fn compare(&self, other: &Loop) -> Vec<String> {
        let mut diffs = Vec::new();
        let ours = self.category.as_deref().unwrap_or("");
        let theirs = other.category.as_deref().unwrap_or("");
        if !ours.eq_ignore_ascii_case(theirs) {
            diffs.push(format!(
                "Loop category does not match: '{}' vs '{}'.",
                ours, theirs
            ));
            return diffs;
        }
        let our_cols: Vec<String> = self.columns.iter().map(|c| c.to_ascii_lowercase()).collect();
        let their_cols: Vec<String> = other
            .columns
            .iter()
            .map(|c| c.to_ascii_lowercase())
            .collect();
        if our_cols != their_cols {
            diffs.push(format!(
                "Loop columns do not match for category '{}'.",
                ours
            ));
            return diffs;
        }
        if self.rows != other.rows {
            let mut sorted_ours = self.rows.clone();
            let mut sorted_theirs = other.rows.clone();
            sorted_ours.sort();
            sorted_theirs.sort();
            if sorted_ours != sorted_theirs {
                diffs.push(format!("Loop data does not match for category '{}'.", ours));
            }
        }
        diffs
    }

    /// Serializes this loop as canonical NMR-STAR text.
    ///
    /// Columns are left-justified to the widest formatted value plus three
    /// spaces; values needing the multi-line form break their row and resume
    /// it on a fresh line.
    pub fn to_star(&self, options: &StarOptions) -> Result<String> {
        if self.columns.is_empty() && self.rows.is_empty() {
            if options.skip_empty_loops {
                return Ok(String::new());
            }
            return Ok("   loop_\n\n   stop_\n".to_string());
        }

        let mut out = String::from("   loop_\n");
        for column in &self.columns {
            out.push_str("      ");
            out.push_str(&self.qualified_column(column));
            out.push('\n');
        }
        out.push('\n');

        if !self.rows.is_empty() {
            let mut formatted = Vec::with_capacity(self.rows.len());
            for row in &self.rows {
                let mut cells = Vec::with_capacity(row.len());
                for value in row {
                    cells.push(quote_value(value, options)?);
                }
                formatted.push(cells);
            }
            let mut widths = vec![0usize; self.columns.len()];
            for cells in &formatted {
                for (i, cell) in cells.iter().enumerate() {
                    widths[i] = widths[i].max(cell.inline_width());
                }
            }
            for width in &mut widths {
                *width += 3;
            }
            for cells in &formatted {
                let mut line = String::from("      ");
                for (i, cell) in cells.iter().enumerate() {
                    match cell {
                        QuotedValue::Inline(text) => {
                            line.push_str(text);
                            for _ in text.chars().count()..widths[i] {
                                line.push(' ');
                            }
                        }
                        QuotedValue::Multiline(_) => {
                            if !line.trim_end().is_empty() {
                                let end = line.trim_end().len();
                                line.truncate(end);
                                out.push_str(&line);
                                out.push('\n');
                            }
                            out.push_str(&cell.render());
                            line = String::from("      ");
                        }
                    }
                }
                if !line.trim_end().is_empty() {
                    let end = line.trim_end().len();
                    line.truncate(end);
                    out.push_str(&line);
                    out.push('\n');
                }
            }
            out.push('\n');
        }
        out.push_str("   stop_\n");
        Ok(out)
    }

    /// The full column reference used in serialized output.
    fn qualified_column(&self, column: &str) -> String {
        match &self.category {
            Some(category) => format!("{}.{}", category, column),
            None => format!("_{}", column),
        }
    }

    pub(crate) fn find_column(&self, bare: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(bare))
    }

    fn check_category(&self, prefix: Option<&str>) -> Result<()> {
        if let (Some(prefix), Some(category)) = (prefix, &self.category) {
            let prefix = normalize_category(prefix);
            if !prefix.eq_ignore_ascii_case(category) {
                return Err(Error::structural(format!(
                    "column category '{}' does not match loop category '{}'",
                    prefix, category
                )));
            }
        }
        Ok(())
    }

    /// Resolves a bare or qualified column reference to its index.
    pub(crate) fn column_index(&self, name: &str) -> Result<usize> {
        let (prefix, bare) = split_tag(name);
        self.check_category(prefix)?;
        self.find_column(bare).ok_or_else(|| {
            Error::structural(format!(
                "unknown column '{}' in loop '{}'",
                name,
                self.category.as_deref().unwrap_or("?")
            ))
        })
    }
}

impl fmt::Display for Loop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_star(&StarOptions::default()) {
            Ok(text) => f.write_str(&text),
            Err(_) => Err(fmt::Error),
        }
    }
}

/// Ensures a category string carries its leading underscore.
pub(crate) fn normalize_category(category: &str) -> String {
    if category.starts_with('_') {
        category.to_string()
    } else {
        format!("_{}", category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_loop() -> Loop {
        let mut lp = Loop::from_scratch();
        lp.add_columns(&["_Test.A", "_Test.B", "_Test.C"]).unwrap();
        lp
    }

    #[test]
    fn test_category_from_first_column() {
        let lp = sample_loop();
        assert_eq!(lp.category(), Some("_Test"));
        assert_eq!(lp.columns(), ["A", "B", "C"]);
    }

    #[test]
    fn test_category_mismatch_rejected() {
        let mut lp = sample_loop();
        let err = lp.add_column("_Other.D").unwrap_err();
        assert!(matches!(err, Error::Structural { .. }));
        assert_eq!(lp.columns().len(), 3);
    }

    #[test]
    fn test_duplicate_column_rejected_case_insensitively() {
        let mut lp = sample_loop();
        assert!(matches!(
            lp.add_column("a"),
            Err(Error::AlreadyExists { .. })
        ));
    }

    #[test]
    fn test_add_data_rearranges() {
        let mut lp = sample_loop();
        lp.add_data((1..=6).map(|n| n.to_string()).collect()).unwrap();
        assert_eq!(lp.rows(), [["1", "2", "3"], ["4", "5", "6"]]);
    }

    #[test]
    fn test_add_data_wrong_width_is_atomic() {
        let mut lp = sample_loop();
        let err = lp
            .add_data((1..=4).map(|n| n.to_string()).collect())
            .unwrap_err();
        assert!(matches!(err, Error::Structural { .. }));
        assert!(lp.is_empty());
    }

    #[test]
    fn test_columns_frozen_after_data() {
        let mut lp = sample_loop();
        lp.add_row(vec!["1".into(), "2".into(), "3".into()]).unwrap();
        assert!(lp.add_column("_Test.D").is_err());
    }

    #[test]
    fn test_sort_rows_numeric() {
        let mut lp = sample_loop();
        lp.add_data(
            ["2", "x", "y", "1", "x", "z", "10", "w", "v"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
        .unwrap();
        lp.sort_rows(&["A"]).unwrap();
        assert_eq!(lp.rows()[0], ["1", "x", "z"]);
        assert_eq!(lp.rows()[1], ["2", "x", "y"]);
        // numeric, not lexical: 10 sorts last
        assert_eq!(lp.rows()[2], ["10", "w", "v"]);
    }

    #[test]
    fn test_sort_rows_later_column_takes_priority() {
        let mut lp = sample_loop();
        lp.add_data(
            ["1", "b", ".", "2", "a", ".", "3", "b", ".", "4", "a", "."]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
        .unwrap();
        lp.sort_rows(&["A", "B"]).unwrap();
        // stable sort by A first, then by B: B dominates, A breaks ties
        let first: Vec<_> = lp.rows().iter().map(|r| r[0].as_str()).collect();
        assert_eq!(first, ["2", "4", "1", "3"]);
    }

    #[test]
    fn test_renumber_sequential_and_idempotent() {
        let mut lp = sample_loop();
        lp.add_data(
            ["9", "x", ".", "7", "y", ".", "9", "z", "."]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
        .unwrap();
        lp.renumber_rows("A", 1, false).unwrap();
        assert_eq!(lp.get_column("A").unwrap(), ["1", "2", "3"]);
        lp.renumber_rows("A", 1, false).unwrap();
        assert_eq!(lp.get_column("A").unwrap(), ["1", "2", "3"]);
    }

    #[test]
    fn test_renumber_maintains_ordering() {
        let mut lp = sample_loop();
        lp.add_data(
            ["5", "x", ".", "5", "y", ".", "8", "z", "."]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
        .unwrap();
        lp.renumber_rows("A", 1, true).unwrap();
        // duplicate runs and gaps survive the shift
        assert_eq!(lp.get_column("A").unwrap(), ["1", "1", "4"]);
    }

    #[test]
    fn test_renumber_non_numeric_restores_data() {
        let mut lp = sample_loop();
        lp.add_data(
            ["1", "x", ".", "oops", "y", "."]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
        .unwrap();
        assert!(lp.renumber_rows("A", 1, true).is_err());
        assert_eq!(lp.get_column("A").unwrap(), ["1", "oops"]);
    }

    #[test]
    fn test_filter_projects_and_checks() {
        let mut lp = sample_loop();
        lp.add_data(
            ["1", "x", "q", "2", "y", "r"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
        .unwrap();
        let picked = lp.filter(&["C", "A"], false).unwrap();
        assert_eq!(picked.columns(), ["C", "A"]);
        assert_eq!(picked.rows(), [["q", "1"], ["r", "2"]]);

        assert!(lp.filter(&["A", "missing"], false).is_err());
        let lenient = lp.filter(&["A", "missing"], true).unwrap();
        assert_eq!(lenient.columns(), ["A"]);
    }

    #[test]
    fn test_remove_columns_is_atomic() {
        let mut lp = sample_loop();
        lp.add_row(vec!["1".into(), "2".into(), "3".into()]).unwrap();
        assert!(lp.remove_columns(&["A", "nope"]).is_err());
        assert_eq!(lp.columns().len(), 3);
        lp.remove_columns(&["B"]).unwrap();
        assert_eq!(lp.columns(), ["A", "C"]);
        assert_eq!(lp.rows(), [["1", "3"]]);
    }

    #[test]
    fn test_clear_data_keeps_columns() {
        let mut lp = sample_loop();
        lp.add_row(vec!["1".into(), "2".into(), "3".into()]).unwrap();
        lp.clear_data();
        assert!(lp.is_empty());
        assert_eq!(lp.columns().len(), 3);
        // columns may grow again once the data is gone
        lp.add_column("_Test.D").unwrap();
    }

    #[test]
    fn test_remove_rows_where() {
        let mut lp = sample_loop();
        lp.add_data(
            ["1", "x", ".", "2", "y", ".", "3", "x", "."]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
        .unwrap();
        assert_eq!(lp.remove_rows_where("B", "x").unwrap(), 2);
        assert_eq!(lp.len(), 1);
    }

    #[test]
    fn test_compare_order_insensitive_fallback() {
        let mut a = sample_loop();
        a.add_data(
            ["1", "x", ".", "2", "y", "."]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
        .unwrap();
        let mut b = Loop::from_template(&a);
        b.add_data(
            ["2", "y", ".", "1", "x", "."]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
        .unwrap();
        assert!(a.compare(&b).is_empty());

        let mut c = Loop::from_template(&a);
        c.add_data(
            ["1", "x", ".", "9", "y", "."]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
        .unwrap();
        assert_eq!(a.compare(&c).len(), 1);
    }

    #[test]
    fn test_qualified_lookup_checks_category() {
        let lp = sample_loop();
        assert!(lp.get_column("_Test.A").is_ok());
        assert!(matches!(
            lp.get_column("_Wrong.A"),
            Err(Error::Structural { .. })
        ));
    }

    #[test]
    fn test_to_star_alignment() {
        let mut lp = sample_loop();
        lp.add_data(
            ["1", "alpha", ".", "20", "b", "."]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
        .unwrap();
        let text = lp.to_star(&StarOptions::default()).unwrap();
        assert!(text.contains("loop_"));
        assert!(text.contains("_Test.A"));
        // widest value in each column + 3 spaces of padding
        assert!(text.contains("1    alpha   ."));
        assert!(text.contains("20   b       ."));
        assert!(text.trim_end().ends_with("stop_"));
    }

    #[test]
    fn test_empty_loop_rendering() {
        let lp = Loop::from_scratch();
        let text = lp.to_star(&StarOptions::default()).unwrap();
        assert_eq!(text, "   loop_\n\n   stop_\n");
        let skipped = lp
            .to_star(&StarOptions::new().with_skip_empty_loops(true))
            .unwrap();
        assert!(skipped.is_empty());
    }
}
