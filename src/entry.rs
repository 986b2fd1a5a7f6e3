//! The root container of an NMR-STAR document.
//!
//! An [`Entry`] owns an ordered list of [`Saveframe`]s with unique names.
//! Cross-references between frames are weak `$name` strings resolved by
//! lookup, so renaming a frame and updating references to it are two
//! explicit, separate operations.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::options::StarOptions;
use crate::parser::Parser;
use crate::saveframe::Saveframe;
use crate::token::Tokenizer;
use crate::{Error, Result};

/// A complete NMR-STAR entry.
///
/// # Examples
///
/// ```rust
/// use nmrstar::{Entry, Saveframe};
///
/// let mut entry = Entry::from_scratch("15000");
/// let mut frame = Saveframe::from_scratch("entry_information");
/// frame.add_tag("_Entry.Sf_category", "entry_information").unwrap();
/// entry.add_saveframe(frame).unwrap();
/// assert_eq!(entry.saveframes().len(), 1);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    entry_id: String,
    saveframes: Vec<Saveframe>,
}

impl Entry {
    /// Creates an empty entry with the given identifier.
    #[must_use]
    pub fn from_scratch(entry_id: impl Into<String>) -> Self {
        Entry {
            entry_id: entry_id.into(),
            saveframes: Vec::new(),
        }
    }

    /// Parses an entry from text with explicit options.
    pub fn parse_with(input: &str, options: &StarOptions) -> Result<Entry> {
        Parser::new(Tokenizer::new(input), options.clone()).parse()
    }

    /// Reads and parses an entry from a file on disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Entry> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(&e.to_string()))?;
        text.parse()
    }

    /// The entry identifier from the `data_` line.
    #[must_use]
    pub fn entry_id(&self) -> &str {
        &self.entry_id
    }

    pub fn set_entry_id(&mut self, entry_id: impl Into<String>) {
        self.entry_id = entry_id.into();
    }

    /// The saveframes, in document order.
    #[must_use]
    pub fn saveframes(&self) -> &[Saveframe] {
        &self.saveframes
    }

    /// Number of saveframes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.saveframes.len()
    }

    /// `true` when the entry holds no saveframes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.saveframes.is_empty()
    }

    /// Appends a saveframe. Names are unique (case-insensitively) within an
    /// entry.
    pub fn add_saveframe(&mut self, frame: Saveframe) -> Result<()> {
        if self.find_frame(frame.name()).is_some() {
            return Err(Error::already_exists(frame.name()));
        }
        self.saveframes.push(frame);
        Ok(())
    }

    /// Finds a saveframe by name.
    #[must_use]
    pub fn get_saveframe(&self, name: &str) -> Option<&Saveframe> {
        self.find_frame(name).map(|idx| &self.saveframes[idx])
    }

    /// Mutable access to a saveframe by name.
    pub fn get_saveframe_mut(&mut self, name: &str) -> Option<&mut Saveframe> {
        self.find_frame(name).map(|idx| &mut self.saveframes[idx])
    }

    /// All saveframes with the given semantic category.
    #[must_use]
    pub fn saveframes_by_category(&self, category: &str) -> Vec<&Saveframe> {
        self.saveframes
            .iter()
            .filter(|frame| {
                frame
                    .category()
                    .is_some_and(|c| c.eq_ignore_ascii_case(category))
            })
            .collect()
    }

    /// Detaches and returns the named saveframe.
    pub fn remove_saveframe(&mut self, name: &str) -> Result<Saveframe> {
        let idx = self
            .find_frame(name)
            .ok_or_else(|| Error::structural(format!("no saveframe named '{}'", name)))?;
        Ok(self.saveframes.remove(idx))
    }

    /// Renames a saveframe.
    ///
    /// `$name` references held in other frames are NOT touched; call
    /// [`update_frame_references`](Self::update_frame_references) when they
    /// should follow the rename.
    pub fn rename_saveframe(&mut self, old: &str, new: impl Into<String>) -> Result<()> {
        let new = new.into();
        let idx = self
            .find_frame(old)
            .ok_or_else(|| Error::structural(format!("no saveframe named '{}'", old)))?;
        if let Some(existing) = self.find_frame(&new) {
            if existing != idx {
                return Err(Error::already_exists(new));
            }
        }
        self.saveframes[idx].set_name(new);
        Ok(())
    }

    /// Rewrites every `$old` reference in tag values and loop cells across
    /// the whole entry to `$new`; returns the number of values rewritten.
    pub fn update_frame_references(&mut self, old: &str, new: &str) -> usize {
        let target = format!("${}", old);
        let replacement = format!("${}", new);
        let mut updated = 0;
        for frame in &mut self.saveframes {
            for (_, value) in frame.tags_mut() {
                if *value == target {
                    *value = replacement.clone();
                    updated += 1;
                }
            }
            for lp in frame.loops_mut() {
                for row in lp.rows_mut() {
                    for cell in row {
                        if *cell == target {
                            *cell = replacement.clone();
                            updated += 1;
                        }
                    }
                }
            }
        }
        updated
    }

    /// Collects every value of a tag across all saveframes.
    ///
    /// A qualified name reads direct tags of frames with that prefix and
    /// columns of loops with that category; a bare name searches everything.
    #[must_use]
    pub fn get_tag_values(&self, name: &str) -> Vec<String> {
        let mut values = Vec::new();
        for frame in &self.saveframes {
            // frames the category does not apply to simply do not match
            if let Ok(found) = frame.get_tag_values(name) {
                values.extend(found);
            }
        }
        values
    }

    /// Structural diff against another entry, as human-readable strings.
    /// An empty result means the entries are structurally equal.
    pub fn compare(&self, other: &Entry) -> Vec<String> {
        let mut diffs = Vec::new();
        if self.entry_id != other.entry_id {
            diffs.push(format!(
                "Entry ID does not match: '{}' vs '{}'.",
                self.entry_id, other.entry_id
            ));
        }
        if self.saveframes.len() != other.saveframes.len() {
            diffs.push(format!(
                "Number of saveframes does not match: {} vs {}.",
                self.saveframes.len(),
                other.saveframes.len()
            ));
            return diffs;
        }
        for (frame, other_frame) in self.saveframes.iter().zip(&other.saveframes) {
            diffs.extend(frame.compare(other_frame));
        }
        diffs
    }

    /// Reports dangling `$name` references as non-fatal finding strings.
    #[must_use]
    pub fn validate_references(&self) -> Vec<String> {
        let mut findings = Vec::new();
        for frame in &self.saveframes {
            for (tag, value) in frame.tags() {
                if let Some(target) = value.strip_prefix('$') {
                    if self.find_frame(target).is_none() {
                        findings.push(format!(
                            "Dangling saveframe reference '{}' in tag '{}' of saveframe '{}'.",
                            value,
                            tag,
                            frame.name()
                        ));
                    }
                }
            }
            for lp in frame.loops() {
                for row in lp.rows() {
                    for cell in row {
                        if let Some(target) = cell.strip_prefix('$') {
                            if self.find_frame(target).is_none() {
                                findings.push(format!(
                                    "Dangling saveframe reference '{}' in loop '{}' of saveframe '{}'.",
                                    cell,
                                    lp.category().unwrap_or("?"),
                                    frame.name()
                                ));
                            }
                        }
                    }
                }
            }
        }
        findings
    }

    /// Serializes the whole entry as canonical NMR-STAR text. The document
    /// itself is never mutated by serialization.
    pub fn to_star(&self, options: &StarOptions) -> Result<String> {
        let mut out = format!("data_{}\n", self.entry_id);
        for frame in &self.saveframes {
            out.push('\n');
            out.push_str(&frame.to_star(options)?);
        }
        Ok(out)
    }

    fn find_frame(&self, name: &str) -> Option<usize> {
        self.saveframes
            .iter()
            .position(|frame| frame.name().eq_ignore_ascii_case(name))
    }
}

impl FromStr for Entry {
    type Err = Error;

    fn from_str(input: &str) -> Result<Entry> {
        Entry::parse_with(input, &StarOptions::default())
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_star(&StarOptions::default()) {
            Ok(text) => f.write_str(&text),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl<'a> IntoIterator for &'a Entry {
    type Item = &'a Saveframe;
    type IntoIter = std::slice::Iter<'a, Saveframe>;

    fn into_iter(self) -> Self::IntoIter {
        self.saveframes.iter()
    }
}
