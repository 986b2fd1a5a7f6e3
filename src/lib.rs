//! # nmrstar
//!
//! A reader, writer and in-memory document model for the NMR-STAR format.
//!
//! ## What is NMR-STAR?
//!
//! NMR-STAR is the CIF-like text format the BMRB uses to exchange
//! structured NMR records: one `data_` block holding named saveframes, each
//! carrying flat tag/value pairs and tabular loops. This crate parses that
//! text into an [`Entry`] / [`Saveframe`] / [`Loop`] tree, lets you build
//! and mutate such trees programmatically under the format's structural
//! invariants, and writes them back out as canonical, column-aligned text.
//!
//! ## Key Features
//!
//! - **Single-pass tokenizer**: streaming scan with 1-based line numbers on
//!   every error
//! - **Round-trip safe**: quoting is chosen so the tokenizer reads every
//!   serialized value back unchanged
//! - **Invariant-enforcing model**: tag-prefix consistency, loop category
//!   uniqueness and fixed row widths are checked on every mutation, which
//!   either succeeds completely or leaves the document untouched
//! - **Explicit configuration**: all policy (strict mode, null literal,
//!   legacy loop merging) lives on a [`StarOptions`] value, never in global
//!   state
//! - **No unsafe code**
//!
//! ## Quick Start
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! nmrstar = "0.1"
//! ```
//!
//! ### Parsing and serializing
//!
//! ```rust
//! use nmrstar::{parse_str, to_string};
//!
//! let text = "data_15000\n\
//!             save_entry_information\n\
//!             _Entry.Sf_category   entry_information\n\
//!             _Entry.ID            15000\n\
//!             save_\n";
//!
//! let entry = parse_str(text).unwrap();
//! assert_eq!(entry.entry_id(), "15000");
//!
//! let frame = entry.get_saveframe("entry_information").unwrap();
//! assert_eq!(frame.get_tag("ID").unwrap(), "15000");
//!
//! // write it back out; parsing the output yields an equal document
//! let round = to_string(&entry).unwrap();
//! assert!(parse_str(&round).unwrap().compare(&entry).is_empty());
//! ```
//!
//! ### Building a document programmatically
//!
//! ```rust
//! use nmrstar::{Entry, Loop, Saveframe};
//!
//! let mut shifts = Loop::from_scratch();
//! shifts.add_columns(&["_Atom_chem_shift.ID", "_Atom_chem_shift.Val"]).unwrap();
//! shifts.add_data(vec!["1".into(), "8.22".into(), "2".into(), "121.5".into()]).unwrap();
//!
//! let mut frame = Saveframe::from_scratch("assigned_chemical_shifts");
//! frame.add_tag("_Assigned_chem_shift_list.Sf_category", "assigned_chemical_shifts").unwrap();
//! frame.add_loop(shifts).unwrap();
//!
//! let mut entry = Entry::from_scratch("demo");
//! entry.add_saveframe(frame).unwrap();
//! ```
//!
//! ### Custom options
//!
//! ```rust
//! use nmrstar::{parse_str_with_options, StarOptions};
//!
//! // strict mode promotes recoverable warnings to fatal errors
//! let options = StarOptions::new().with_strict(true);
//! assert!(parse_str_with_options("data_x\nsave_s\n_S.V 1\nloop_ stop_\nsave_\n", &options).is_err());
//! ```
//!
//! ## Scope
//!
//! Schema dictionaries are consumed through the
//! [`SchemaLookup`](schema::SchemaLookup) interface, not loaded from BMRB
//! files; network fetching, CSV wrappers and CLI tooling belong to other
//! crates. See the [`spec`] module for the format notes this implementation
//! follows.

pub mod entry;
pub mod error;
pub mod loops;
pub mod options;
pub mod parser;
pub mod quote;
pub mod saveframe;
pub mod schema;
pub mod spec;
pub mod token;
pub mod tree;

pub use entry::Entry;
pub use error::{Error, Result, Warning};
pub use loops::Loop;
pub use options::StarOptions;
pub use parser::Parser;
pub use saveframe::Saveframe;
pub use token::Tokenizer;
pub use tree::{EntryTree, LoopTree, SaveframeTree};

use std::io;

/// Parses an entry from a string of NMR-STAR text.
///
/// # Examples
///
/// ```rust
/// use nmrstar::parse_str;
///
/// let entry = parse_str("data_x\nsave_s\n_S.Value 1\nsave_\n").unwrap();
/// assert_eq!(entry.entry_id(), "x");
/// ```
///
/// # Errors
///
/// Returns an error if the input is not well-formed NMR-STAR. Parse errors
/// carry the 1-based line number of the offending token.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_str(input: &str) -> Result<Entry> {
    parse_str_with_options(input, &StarOptions::default())
}

/// Parses an entry with explicit options.
///
/// # Errors
///
/// Returns an error if the input is not well-formed, or, under
/// [`StarOptions::strict`], on any recoverable anomaly.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_str_with_options(input: &str, options: &StarOptions) -> Result<Entry> {
    Entry::parse_with(input, options)
}

/// Parses an entry from an I/O stream of NMR-STAR text.
///
/// # Errors
///
/// Returns an error if reading fails or the text is not well-formed.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_reader<R: io::Read>(mut reader: R) -> Result<Entry> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| Error::io(&e.to_string()))?;
    parse_str(&text)
}

/// Parses an entry from bytes of NMR-STAR text.
///
/// # Errors
///
/// Returns an error if the bytes are not valid UTF-8 or the text is not
/// well-formed.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_slice(bytes: &[u8]) -> Result<Entry> {
    let text = std::str::from_utf8(bytes).map_err(|e| Error::custom(e.to_string()))?;
    parse_str(text)
}

/// Serializes an entry to canonical NMR-STAR text.
///
/// # Examples
///
/// ```rust
/// use nmrstar::{parse_str, to_string};
///
/// let entry = parse_str("data_x\nsave_s\n_S.Value 1\nsave_\n").unwrap();
/// let text = to_string(&entry).unwrap();
/// assert!(text.starts_with("data_x\n"));
/// ```
///
/// # Errors
///
/// Returns an error if any value cannot be represented (the empty string).
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string(entry: &Entry) -> Result<String> {
    to_string_with_options(entry, &StarOptions::default())
}

/// Serializes an entry with explicit options.
///
/// # Errors
///
/// Returns an error if any value cannot be represented.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_options(entry: &Entry, options: &StarOptions) -> Result<String> {
    entry.to_star(options)
}

/// Serializes an entry to a writer.
///
/// # Errors
///
/// Returns an error if serialization fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W: io::Write>(writer: W, entry: &Entry) -> Result<()> {
    to_writer_with_options(writer, entry, &StarOptions::default())
}

/// Serializes an entry to a writer with explicit options.
///
/// # Errors
///
/// Returns an error if serialization fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer_with_options<W: io::Write>(
    mut writer: W,
    entry: &Entry,
    options: &StarOptions,
) -> Result<()> {
    let text = to_string_with_options(entry, options)?;
    writer
        .write_all(text.as_bytes())
        .map_err(|e| Error::io(&e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_entry() -> Entry {
        let mut lp = Loop::from_scratch();
        lp.add_columns(&["_Author.Ordinal", "_Author.Family_name"]).unwrap();
        lp.add_data(vec![
            "1".into(),
            "Cornilescu".into(),
            "2".into(),
            "Bax".into(),
        ])
        .unwrap();

        let mut frame = Saveframe::from_scratch("entry_information");
        frame
            .add_tag("_Entry.Sf_category", "entry_information")
            .unwrap();
        frame.add_tag("Title", "A demo entry").unwrap();
        frame.add_loop(lp).unwrap();

        let mut entry = Entry::from_scratch("demo");
        entry.add_saveframe(frame).unwrap();
        entry
    }

    #[test]
    fn test_parse_serialize_round_trip() {
        let entry = demo_entry();
        let text = to_string(&entry).unwrap();
        let reparsed = parse_str(&text).unwrap();
        assert!(entry.compare(&reparsed).is_empty());
    }

    #[test]
    fn test_parse_reader_and_slice() {
        let text = to_string(&demo_entry()).unwrap();
        let from_reader = parse_reader(std::io::Cursor::new(text.as_bytes())).unwrap();
        let from_slice = parse_slice(text.as_bytes()).unwrap();
        assert_eq!(from_reader, from_slice);
    }

    #[test]
    fn test_to_writer() {
        let mut buffer = Vec::new();
        to_writer(&mut buffer, &demo_entry()).unwrap();
        assert!(buffer.starts_with(b"data_demo\n"));
    }

    #[test]
    fn test_entry_from_str_trait() {
        let entry: Entry = "data_x\nsave_s\n_S.V 1\nsave_\n".parse().unwrap();
        assert_eq!(entry.entry_id(), "x");
    }
}
