//! The schema collaborator interface.
//!
//! The core treats a BMRB-style dictionary as an external lookup service:
//! given a qualified tag, report its declared type, nullability, owning
//! category and canonical capitalization. [`SchemaLookup`] is that
//! interface; type conversion and validation are provided methods on top of
//! it, and the core only calls them when explicitly asked to.
//!
//! [`MapSchema`] is a minimal in-memory implementation for callers and
//! tests. It keeps definitions in insertion order, which doubles as the
//! dictionary ordinal returned by `tag_sort_key`. Loading a real dictionary
//! file is out of scope for this crate.

use indexmap::IndexMap;
use std::fmt;

use crate::entry::Entry;
use crate::loops::normalize_category;
use crate::quote::split_tag;
use crate::{Error, Result};

/// Declared data type of a tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagType {
    Str,
    Int,
    Float,
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagType::Str => write!(f, "string"),
            TagType::Int => write!(f, "integer"),
            TagType::Float => write!(f, "float"),
        }
    }
}

/// What a schema knows about one tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagInfo {
    pub data_type: TagType,
    pub nullable: bool,
    /// Owning category, with its leading underscore.
    pub category: String,
    /// The dictionary's capitalization of the qualified name.
    pub canonical_name: String,
}

/// A raw text value converted through the schema.
#[derive(Clone, Debug, PartialEq)]
pub enum TypedValue {
    Null,
    Str(String),
    Int(i64),
    Float(f64),
}

/// The null placeholders of the text format.
const NULL_LITERALS: [&str; 2] = [".", "?"];

/// Lookup service over a tag dictionary.
pub trait SchemaLookup {
    /// Looks up a qualified tag, case-insensitively.
    fn lookup(&self, tag: &str) -> Option<&TagInfo>;

    /// Dictionary ordinal of a qualified tag, for canonical ordering.
    fn tag_sort_key(&self, tag: &str) -> Option<usize>;

    /// Converts raw text to the tag's declared type. The null placeholders
    /// `.` and `?` convert to [`TypedValue::Null`] regardless of type.
    fn convert(&self, tag: &str, raw: &str) -> Result<TypedValue> {
        let info = self
            .lookup(tag)
            .ok_or_else(|| Error::custom(format!("tag '{}' not found in schema", tag)))?;
        if NULL_LITERALS.contains(&raw) {
            return Ok(TypedValue::Null);
        }
        match info.data_type {
            TagType::Str => Ok(TypedValue::Str(raw.to_string())),
            TagType::Int => raw.trim().parse().map(TypedValue::Int).map_err(|_| {
                Error::custom(format!("value '{}' of tag '{}' is not an integer", raw, tag))
            }),
            TagType::Float => raw.trim().parse().map(TypedValue::Float).map_err(|_| {
                Error::custom(format!("value '{}' of tag '{}' is not a float", raw, tag))
            }),
        }
    }

    /// Checks one value against the schema; findings are returned, never
    /// raised.
    fn validate_type(&self, tag: &str, value: &str, category: Option<&str>) -> Vec<String> {
        let info = match self.lookup(tag) {
            Some(info) => info,
            None => return vec![format!("Tag '{}' not found in schema.", tag)],
        };
        let mut findings = Vec::new();
        if let Some(category) = category {
            if !info.category.eq_ignore_ascii_case(&normalize_category(category)) {
                findings.push(format!(
                    "Tag '{}' belongs to category '{}', not '{}'.",
                    tag, info.category, category
                ));
            }
        }
        if NULL_LITERALS.contains(&value) {
            if !info.nullable {
                findings.push(format!("Null value for non-nullable tag '{}'.", tag));
            }
            return findings;
        }
        let type_ok = match info.data_type {
            TagType::Str => true,
            TagType::Int => value.trim().parse::<i64>().is_ok(),
            TagType::Float => value.trim().parse::<f64>().is_ok(),
        };
        if !type_ok {
            findings.push(format!(
                "Value '{}' of tag '{}' is not a valid {}.",
                value, tag, info.data_type
            ));
        }
        findings
    }
}

/// An in-memory schema built by the caller.
///
/// # Examples
///
/// ```rust
/// use nmrstar::schema::{MapSchema, SchemaLookup, TagType};
///
/// let mut schema = MapSchema::new();
/// schema.define("_Entry.ID", TagType::Int, false);
/// schema.define("_Entry.Title", TagType::Str, true);
/// assert_eq!(schema.tag_sort_key("_entry.title"), Some(1));
/// assert!(schema.lookup("_Entry.ID").is_some());
/// ```
#[derive(Clone, Debug, Default)]
pub struct MapSchema {
    tags: IndexMap<String, TagInfo>,
}

impl MapSchema {
    #[must_use]
    pub fn new() -> Self {
        MapSchema::default()
    }

    /// Defines one tag. Insertion order is the dictionary order.
    pub fn define(&mut self, qualified: &str, data_type: TagType, nullable: bool) {
        let (prefix, bare) = split_tag(qualified);
        let category = normalize_category(prefix.unwrap_or(""));
        let canonical = format!("{}.{}", category, bare);
        self.tags.insert(
            canonical.to_ascii_lowercase(),
            TagInfo {
                data_type,
                nullable,
                category,
                canonical_name: canonical,
            },
        );
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl SchemaLookup for MapSchema {
    fn lookup(&self, tag: &str) -> Option<&TagInfo> {
        self.tags.get(&schema_key(tag))
    }

    fn tag_sort_key(&self, tag: &str) -> Option<usize> {
        self.tags.get_index_of(&schema_key(tag))
    }
}

fn schema_key(tag: &str) -> String {
    let (prefix, bare) = split_tag(tag);
    format!("{}.{}", normalize_category(prefix.unwrap_or("")), bare).to_ascii_lowercase()
}

impl Entry {
    /// Checks the whole entry against a schema.
    ///
    /// Findings cover unknown tags, type mismatches, null values in
    /// non-nullable tags, capitalization drift from the dictionary, and
    /// dangling `$name` references. Findings are collected and returned,
    /// never raised.
    pub fn validate(&self, schema: &dyn SchemaLookup) -> Vec<String> {
        let mut findings = self.validate_references();
        for frame in self.saveframes() {
            let prefix = match frame.tag_prefix() {
                Some(prefix) => prefix,
                None => continue,
            };
            for (tag, value) in frame.tags() {
                let qualified = format!("{}.{}", prefix, tag);
                match schema.lookup(&qualified) {
                    None => findings.push(format!("Tag '{}' not found in schema.", qualified)),
                    Some(info) => {
                        if info.canonical_name != qualified {
                            findings.push(format!(
                                "Tag '{}' does not match schema capitalization '{}'.",
                                qualified, info.canonical_name
                            ));
                        }
                        findings.extend(schema.validate_type(&qualified, value, Some(prefix)));
                    }
                }
            }
            for lp in frame.loops() {
                let category = match lp.category() {
                    Some(category) => category,
                    None => continue,
                };
                for (idx, column) in lp.columns().iter().enumerate() {
                    let qualified = format!("{}.{}", category, column);
                    match schema.lookup(&qualified) {
                        None => {
                            findings.push(format!("Tag '{}' not found in schema.", qualified));
                        }
                        Some(info) => {
                            if info.canonical_name != qualified {
                                findings.push(format!(
                                    "Tag '{}' does not match schema capitalization '{}'.",
                                    qualified, info.canonical_name
                                ));
                            }
                            for row in lp.rows() {
                                findings.extend(schema.validate_type(
                                    &qualified,
                                    &row[idx],
                                    Some(category),
                                ));
                            }
                        }
                    }
                }
            }
        }
        findings
    }
}
