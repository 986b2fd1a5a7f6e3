//! NMR-STAR Format Notes
//!
//! This module documents the subset of the STAR grammar this library reads
//! and writes, and the conventions its serializer follows.
//!
//! # Overview
//!
//! NMR-STAR is the CIF-family text format used by the BMRB to exchange NMR
//! records. A file is one `data_` block holding named saveframes; each
//! saveframe holds flat tag/value pairs and tabular loops:
//!
//! ```text
//! data_15000
//!
//! save_entry_information
//!    _Entry.Sf_category   entry_information
//!    _Entry.ID            15000
//!
//!    loop_
//!       _Entry_author.Ordinal
//!       _Entry_author.Family_name
//!
//!       1   Cornilescu
//!       2   Bax
//!
//!    stop_
//!
//! save_
//! ```
//!
//! # Tokens
//!
//! Whitespace (space, tab, newline, vertical tab) separates tokens. Input
//! newlines are normalized to LF before scanning. Five delimiters exist:
//!
//! | Form | Example | Notes |
//! |------|---------|-------|
//! | bare | `1.204` | runs to the next whitespace |
//! | single-quoted | `'two words'` | closes on `'` followed by whitespace |
//! | double-quoted | `"say 'hi'"` | closes on `"` followed by whitespace |
//! | multi-line | `;` … `;` | opening and closing `;` at line start |
//! | frame pointer | `$sample_1` | a bare word naming another saveframe |
//!
//! A `#` at token-start position opens a comment running to end of line.
//! Quoted values are line-bounded. An embedded quote character only closes
//! its token when whitespace follows, so `'it's fine'` is one token.
//!
//! Multi-line values keep their content verbatim between the delimiter
//! lines; the newline before the closing `;` belongs to the delimiter, as
//! does one newline directly after the opening `;`. A closing `;` followed
//! immediately by data terminates the value but is flagged as a warning.
//!
//! # Keywords
//!
//! `data_`, `save_`, `loop_`, `stop_` and `global_` are recognized
//! case-insensitively. A reserved keyword appearing as a bare data value is
//! a parse error: it almost always means a `stop_` or `save_` terminator is
//! missing. Quoted or multi-line delimited keywords are ordinary values.
//!
//! # Grammar
//!
//! ```text
//! document   := "data_" IDENT saveframe*
//! saveframe  := "save_" IDENT (tag | loop)* "save_"
//! tag        := NAME value              ; NAME starts with "_"
//! loop       := "loop_" column+ value* "stop_"
//! column     := NAME
//! ```
//!
//! Loop values flow in row-major order across lines; the parser chunks them
//! into rows of the declared column width and rejects a non-exact final
//! chunk. Columns cannot be declared once data has started. A loop without
//! columns or without data is tolerated with a warning (fatal in strict
//! mode).
//!
//! # Structural invariants
//!
//! - Saveframe names are unique within an entry (case-insensitive).
//! - All direct tags of a saveframe share one prefix, fixed by the first
//!   tag added (`_Entry.ID` and `_Entry.Title` may coexist; `_Other.X` may
//!   not).
//! - A saveframe holds at most one loop per category.
//! - Column names are unique within a loop (case-insensitive), and every
//!   row is exactly as wide as the column list.
//!
//! # Quoting on output
//!
//! The serializer picks the simplest lossless form, in order: the null
//! literal for absent values; the multi-line form for values with newlines
//! (re-indented by one space when a line would begin with `;`); bare for
//! plain words; single then double quotes when the value holds whitespace,
//! `#`, a leading `_` or quote character, or starts like a keyword; the
//! multi-line form again when both quote kinds appear and neither wrapping
//! is safe. The empty string has no representation and is a formatting
//! error.
//!
//! # Canonical layout
//!
//! Saveframe tags are aligned to the widest qualified tag name. Loop
//! columns are left-justified to their widest formatted value plus three
//! spaces. A row value needing the multi-line form interrupts its row and
//! the row resumes on a fresh indented line. Empty loops serialize as a
//! bare `loop_`/`stop_` pair unless suppressed by
//! [`StarOptions::skip_empty_loops`](crate::StarOptions).
//!
//! # References
//!
//! The format is described in the BMRB dictionary documentation at
//! <https://bmrb.io/dictionary/>.

// This module contains only documentation; no implementation code
