//! The named record block of an entry.
//!
//! A [`Saveframe`] owns an ordered list of `(tag, value)` pairs sharing one
//! tag prefix, and an ordered list of [`Loop`]s with unique categories. The
//! prefix is fixed by the first (qualified) tag added; later tags may use
//! bare names. The frame's semantic category mirrors the value of its
//! `Sf_category` tag when one is present.

use std::fmt;

use crate::loops::{normalize_category, Loop};
use crate::options::StarOptions;
use crate::quote::{quote_value, split_tag, QuotedValue};
use crate::{Error, Result};

/// A saveframe: flat tags plus nested loops.
///
/// # Examples
///
/// ```rust
/// use nmrstar::Saveframe;
///
/// let mut frame = Saveframe::from_scratch("entry_information");
/// frame.add_tag("_Entry.Sf_category", "entry_information").unwrap();
/// frame.add_tag("Title", "Solution structure of ubiquitin").unwrap();
/// assert_eq!(frame.tag_prefix(), Some("_Entry"));
/// assert_eq!(frame.category(), Some("entry_information"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Saveframe {
    name: String,
    category: Option<String>,
    tag_prefix: Option<String>,
    tags: Vec<(String, String)>,
    loops: Vec<Loop>,
}

impl Saveframe {
    /// Creates an empty saveframe with the given name.
    #[must_use]
    pub fn from_scratch(name: impl Into<String>) -> Self {
        Saveframe {
            name: name.into(),
            category: None,
            tag_prefix: None,
            tags: Vec::new(),
            loops: Vec::new(),
        }
    }

    /// Creates a structural copy of `source` under a new name: same prefix,
    /// category and tag names with every value set to the null literal, and
    /// the column skeleton of each loop without its data.
    #[must_use]
    pub fn from_template(source: &Saveframe, name: impl Into<String>, options: &StarOptions) -> Self {
        Saveframe {
            name: name.into(),
            category: source.category.clone(),
            tag_prefix: source.tag_prefix.clone(),
            tags: source
                .tags
                .iter()
                .map(|(tag, _)| (tag.clone(), options.null_literal.clone()))
                .collect(),
            loops: source.loops.iter().map(Loop::from_template).collect(),
        }
    }

    /// The saveframe name (unique within its entry).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the frame. Uniqueness within an entry is the entry's concern
    /// (see [`Entry::rename_saveframe`](crate::Entry::rename_saveframe)), as
    /// is updating `$name` references held elsewhere.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The frame's semantic category, if known.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn set_category(&mut self, category: impl Into<String>) {
        self.category = Some(category.into());
    }

    /// The shared prefix of all direct tags, with its leading underscore.
    #[must_use]
    pub fn tag_prefix(&self) -> Option<&str> {
        self.tag_prefix.as_deref()
    }

    /// Fixes the tag prefix ahead of adding bare-named tags. Fails once any
    /// tag is present.
    pub fn set_tag_prefix(&mut self, prefix: &str) -> Result<()> {
        if !self.tags.is_empty() {
            return Err(Error::structural(
                "cannot change the tag prefix of a saveframe that holds tags",
            ));
        }
        self.tag_prefix = Some(normalize_category(prefix));
        Ok(())
    }

    /// The `(bare name, value)` pairs, in insertion order.
    #[must_use]
    pub fn tags(&self) -> &[(String, String)] {
        &self.tags
    }

    /// The loops, in insertion order.
    #[must_use]
    pub fn loops(&self) -> &[Loop] {
        &self.loops
    }

    /// Adds one tag, by qualified or bare name.
    ///
    /// The first tag must be qualified (it establishes the prefix) unless
    /// [`set_tag_prefix`](Self::set_tag_prefix) ran first; afterwards a
    /// qualified name must match the prefix. Adding a tag bare-named
    /// `Sf_category` fills in the frame's category when unset.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyExists`] for a duplicate tag name
    /// (case-insensitive), [`Error::Structural`] for a prefix mismatch or a
    /// missing prefix.
    pub fn add_tag(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        let (prefix, bare) = split_tag(name);
        if bare.is_empty() {
            return Err(Error::structural(format!("invalid tag name '{}'", name)));
        }
        match (prefix, &self.tag_prefix) {
            (Some(given), Some(current)) => {
                let given = normalize_category(given);
                if !given.eq_ignore_ascii_case(current) {
                    return Err(Error::structural(format!(
                        "tag prefix '{}' does not match saveframe prefix '{}'",
                        given, current
                    )));
                }
            }
            (Some(given), None) => {
                self.tag_prefix = Some(normalize_category(given));
            }
            (None, Some(_)) => {}
            (None, None) => {
                return Err(Error::structural(format!(
                    "cannot add bare tag '{}' before a tag prefix is established",
                    bare
                )));
            }
        }
        if self.find_tag(bare).is_some() {
            return Err(Error::already_exists(bare));
        }
        let value = value.into();
        if bare.eq_ignore_ascii_case("sf_category") && self.category.is_none() {
            self.category = Some(value.clone());
        }
        self.tags.push((bare.to_string(), value));
        Ok(())
    }

    /// Adds several tags atomically: either every pair is valid and all are
    /// added, or the frame is left untouched.
    pub fn add_tags<S: AsRef<str>, V: AsRef<str>>(&mut self, pairs: &[(S, V)]) -> Result<()> {
        let mut trial = self.clone();
        for (name, value) in pairs {
            trial.add_tag(name.as_ref(), value.as_ref())?;
        }
        *self = trial;
        Ok(())
    }

    /// Replaces the value of an existing direct tag.
    pub fn set_tag_value(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        let idx = self.tag_index(name)?;
        self.tags[idx].1 = value.into();
        Ok(())
    }

    /// Returns the single value of a tag; the tag must resolve to exactly
    /// one value. Use [`get_tag_values`](Self::get_tag_values) for lookups
    /// that may reach several loop cells.
    pub fn get_tag(&self, name: &str) -> Result<String> {
        let mut values = self.get_tag_values(name)?;
        match values.len() {
            0 => Err(Error::structural(format!(
                "tag '{}' not found in saveframe '{}'",
                name, self.name
            ))),
            1 => Ok(values.remove(0)),
            n => Err(Error::structural(format!(
                "tag '{}' resolves to {} values in saveframe '{}'",
                name, n, self.name
            ))),
        }
    }

    /// Category-aware tag lookup.
    ///
    /// A qualified name must carry either the frame's own prefix (reading a
    /// direct tag) or the category of one of its loops (reading that loop's
    /// column); any other category is an error. A bare name searches the
    /// direct tags and every loop.
    pub fn get_tag_values(&self, name: &str) -> Result<Vec<String>> {
        let (prefix, bare) = split_tag(name);
        if let Some(prefix) = prefix {
            let prefix = normalize_category(prefix);
            if self
                .tag_prefix
                .as_deref()
                .is_some_and(|p| p.eq_ignore_ascii_case(&prefix))
            {
                return Ok(self
                    .find_tag(bare)
                    .map(|idx| vec![self.tags[idx].1.clone()])
                    .unwrap_or_default());
            }
            if let Some(lp) = self.loop_by_category(&prefix) {
                return Ok(match lp.find_column(bare) {
                    Some(_) => lp.get_column(bare)?,
                    None => Vec::new(),
                });
            }
            return Err(Error::structural(format!(
                "category '{}' matches neither the prefix of saveframe '{}' nor any of its loops",
                prefix, self.name
            )));
        }
        let mut values: Vec<String> = self
            .find_tag(bare)
            .map(|idx| vec![self.tags[idx].1.clone()])
            .unwrap_or_default();
        for lp in &self.loops {
            if lp.find_column(bare).is_some() {
                values.extend(lp.get_column(bare)?);
            }
        }
        Ok(values)
    }

    /// Removes the named direct tags atomically: if any name fails to
    /// resolve, nothing is removed.
    pub fn remove_tags<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        let mut indices = Vec::with_capacity(names.len());
        for name in names {
            let idx = self.tag_index(name.as_ref())?;
            if indices.contains(&idx) {
                return Err(Error::structural(format!(
                    "tag '{}' listed more than once",
                    name.as_ref()
                )));
            }
            indices.push(idx);
        }
        indices.sort_unstable_by(|a, b| b.cmp(a));
        for idx in indices {
            self.tags.remove(idx);
        }
        Ok(())
    }

    /// Attaches a loop. At most one loop per category may exist in a frame.
    pub fn add_loop(&mut self, lp: Loop) -> Result<()> {
        let duplicate = self.loops.iter().any(|existing| {
            match (existing.category(), lp.category()) {
                (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                (None, None) => true,
                _ => false,
            }
        });
        if duplicate {
            return Err(Error::already_exists(
                lp.category().unwrap_or("uncategorized loop"),
            ));
        }
        self.loops.push(lp);
        Ok(())
    }

    /// Finds the loop with the given category, if any.
    #[must_use]
    pub fn get_loop(&self, category: &str) -> Option<&Loop> {
        self.loop_by_category(&normalize_category(category))
    }

    /// Mutable access to the loop with the given category.
    pub fn get_loop_mut(&mut self, category: &str) -> Option<&mut Loop> {
        let category = normalize_category(category);
        self.loops.iter_mut().find(|lp| {
            lp.category()
                .is_some_and(|c| c.eq_ignore_ascii_case(&category))
        })
    }

    /// Detaches and returns the loop with the given category.
    pub fn remove_loop(&mut self, category: &str) -> Result<Loop> {
        let category = normalize_category(category);
        let idx = self
            .loops
            .iter()
            .position(|lp| {
                lp.category()
                    .is_some_and(|c| c.eq_ignore_ascii_case(&category))
            })
            .ok_or_else(|| {
                Error::structural(format!(
                    "saveframe '{}' has no loop with category '{}'",
                    self.name, category
                ))
            })?;
        Ok(self.loops.remove(idx))
    }

    pub(crate) fn tags_mut(&mut self) -> &mut [(String, String)] {
        &mut self.tags
    }

    pub(crate) fn loops_mut(&mut self) -> &mut [Loop] {
        &mut self.loops
    }

    /// Structural diff against another saveframe, as human-readable strings.
    pub fn compare(&self, other: &Saveframe) -> Vec<String> {
        let mut diffs = Vec::new();
        if self.name != other.name {
            diffs.push(format!(
                "Saveframe names do not match: '{}' vs '{}'.",
                self.name, other.name
            ));
            return diffs;
        }
        if self.category != other.category {
            diffs.push(format!(
                "Saveframe category does not match for '{}': '{:?}' vs '{:?}'.",
                self.name, self.category, other.category
            ));
        }
        let ours = self.tag_prefix.as_deref().unwrap_or("");
        let theirs = other.tag_prefix.as_deref().unwrap_or("");
        if !ours.eq_ignore_ascii_case(theirs) {
            diffs.push(format!(
                "Tag prefix does not match for '{}': '{}' vs '{}'.",
                self.name, ours, theirs
            ));
        }
        if self.tags.len() != other.tags.len() {
            diffs.push(format!(
                "Number of tags does not match for '{}': {} vs {}.",
                self.name,
                self.tags.len(),
                other.tags.len()
            ));
        } else {
            for ((tag, value), (other_tag, other_value)) in self.tags.iter().zip(&other.tags) {
                if !tag.eq_ignore_ascii_case(other_tag) || value != other_value {
                    diffs.push(format!(
                        "Tag does not match for '{}': '{} = {}' vs '{} = {}'.",
                        self.name, tag, value, other_tag, other_value
                    ));
                }
            }
        }
        if self.loops.len() != other.loops.len() {
            diffs.push(format!(
                "Number of loops does not match for '{}': {} vs {}.",
                self.name,
                self.loops.len(),
                other.loops.len()
            ));
        } else {
            for (lp, other_lp) in self.loops.iter().zip(&other.loops) {
                diffs.extend(lp.compare(other_lp));
            }
        }
        diffs
    }

    /// Serializes this saveframe as canonical NMR-STAR text. Tags are
    /// aligned to the widest qualified tag name in the frame.
    pub fn to_star(&self, options: &StarOptions) -> Result<String> {
        let mut out = format!("save_{}\n", self.name);
        if !self.tags.is_empty() {
            let prefix = self.tag_prefix.as_deref().unwrap_or("_");
            let width = self
                .tags
                .iter()
                .map(|(tag, _)| prefix.chars().count() + 1 + tag.chars().count())
                .max()
                .unwrap_or(0);
            for (tag, value) in &self.tags {
                let qualified = format!("{}.{}", prefix, tag);
                match quote_value(value, options)? {
                    QuotedValue::Inline(text) => {
                        out.push_str("   ");
                        out.push_str(&qualified);
                        for _ in qualified.chars().count()..width {
                            out.push(' ');
                        }
                        out.push_str("   ");
                        out.push_str(&text);
                        out.push('\n');
                    }
                    multiline => {
                        out.push_str("   ");
                        out.push_str(&qualified);
                        out.push('\n');
                        out.push_str(&multiline.render());
                    }
                }
            }
        }
        for lp in &self.loops {
            let block = lp.to_star(options)?;
            if !block.is_empty() {
                out.push('\n');
                out.push_str(&block);
            }
        }
        out.push_str("\nsave_\n");
        Ok(out)
    }

    fn find_tag(&self, bare: &str) -> Option<usize> {
        self.tags
            .iter()
            .position(|(tag, _)| tag.eq_ignore_ascii_case(bare))
    }

    /// Resolves a direct-tag reference, checking any category prefix
    /// against the frame's own.
    fn tag_index(&self, name: &str) -> Result<usize> {
        let (prefix, bare) = split_tag(name);
        if let (Some(given), Some(current)) = (prefix, &self.tag_prefix) {
            let given = normalize_category(given);
            if !given.eq_ignore_ascii_case(current) {
                return Err(Error::structural(format!(
                    "tag prefix '{}' does not match saveframe prefix '{}'",
                    given, current
                )));
            }
        }
        self.find_tag(bare).ok_or_else(|| {
            Error::structural(format!(
                "tag '{}' not found in saveframe '{}'",
                name, self.name
            ))
        })
    }

    fn loop_by_category(&self, category: &str) -> Option<&Loop> {
        self.loops.iter().find(|lp| {
            lp.category()
                .is_some_and(|c| c.eq_ignore_ascii_case(category))
        })
    }
}

impl fmt::Display for Saveframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_star(&StarOptions::default()) {
            Ok(text) => f.write_str(&text),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl<'a> IntoIterator for &'a Saveframe {
    type Item = &'a Loop;
    type IntoIter = std::slice::Iter<'a, Loop>;

    fn into_iter(self) -> Self::IntoIter {
        self.loops.iter()
    }
}
