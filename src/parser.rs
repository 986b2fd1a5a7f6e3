//! The grammar state machine.
//!
//! The [`Parser`] drives an [`Entry`] out of any [`TokenSource`], enforcing
//! the grammar in one forward pass:
//!
//! ```text
//! data_<name>  ( save_<name>  ( tag value | loop_ column+ value* stop_ )*  save_ )*
//! ```
//!
//! Every grammar violation aborts with an [`Error::Parse`] carrying the line
//! number of the offending token. Recoverable anomalies (a loop without
//! columns or without data, a sloppy multi-line terminator) are collected as
//! [`Warning`]s, suppressed by default and fatal under
//! [`StarOptions::strict`].

use crate::entry::Entry;
use crate::loops::Loop;
use crate::options::StarOptions;
use crate::saveframe::Saveframe;
use crate::token::{is_reserved_value, Delimiter, Token, TokenSource, Tokenizer};
use crate::{Error, Result, Warning};

/// Parses NMR-STAR text into the document model.
///
/// # Examples
///
/// ```rust
/// use nmrstar::{Parser, StarOptions};
///
/// let text = "data_test\nsave_frame1\n_Frame1.Name value1\nsave_\n";
/// let parser = Parser::from_str(text, StarOptions::default());
/// let entry = parser.parse().unwrap();
/// assert_eq!(entry.entry_id(), "test");
/// ```
pub struct Parser<S: TokenSource> {
    source: S,
    options: StarOptions,
    warnings: Vec<Warning>,
}

impl Parser<Tokenizer> {
    /// Creates a parser over the reference tokenizer.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(input: &str, options: StarOptions) -> Self {
        Parser::new(Tokenizer::new(input), options)
    }
}

impl<S: TokenSource> Parser<S> {
    /// Creates a parser over any token source.
    pub fn new(source: S, options: StarOptions) -> Self {
        Parser {
            source,
            options,
            warnings: Vec::new(),
        }
    }

    /// Parses one complete entry, discarding collected warnings.
    pub fn parse(self) -> Result<Entry> {
        self.parse_with_warnings().map(|(entry, _)| entry)
    }

    /// Parses one complete entry and returns the warnings alongside it.
    pub fn parse_with_warnings(mut self) -> Result<(Entry, Vec<Warning>)> {
        let entry = self.parse_entry()?;
        Ok((entry, self.warnings))
    }

    fn parse_entry(&mut self) -> Result<Entry> {
        let first = self
            .next()?
            .ok_or_else(|| Error::parse(1, "empty input: expected a 'data_<name>' block"))?;
        let lower = first.text.to_ascii_lowercase();
        if first.delimiter != Delimiter::Bare || !lower.starts_with("data_") {
            return Err(Error::parse(
                first.line,
                format!(
                    "expected 'data_<name>' to open the entry, found '{}'",
                    first.text
                ),
            ));
        }
        let entry_id = &first.text[5..];
        if entry_id.is_empty() {
            return Err(Error::parse(
                first.line,
                "the data_ block needs a non-empty name",
            ));
        }
        let mut entry = Entry::from_scratch(entry_id);

        while let Some(tok) = self.next()? {
            let lower = tok.text.to_ascii_lowercase();
            if tok.delimiter != Delimiter::Bare
                || !lower.starts_with("save_")
                || tok.text.len() == 5
            {
                return Err(Error::parse(
                    tok.line,
                    format!(
                        "expected 'save_<name>' to open a saveframe, found '{}'",
                        tok.text
                    ),
                ));
            }
            let name = tok.text[5..].to_string();
            let frame = self.parse_saveframe(&name, tok.line)?;
            entry
                .add_saveframe(frame)
                .map_err(|e| Error::parse(tok.line, e.to_string()))?;
        }
        Ok(entry)
    }

    fn parse_saveframe(&mut self, name: &str, open_line: usize) -> Result<Saveframe> {
        let mut frame = Saveframe::from_scratch(name);
        loop {
            let tok = self.next()?.ok_or_else(|| {
                Error::parse(
                    self.source.line(),
                    format!(
                        "end of input while saveframe '{}' (opened on line {}) is open",
                        name, open_line
                    ),
                )
            })?;
            let lower = tok.text.to_ascii_lowercase();
            let bare = tok.delimiter == Delimiter::Bare;

            if lower == "save_" && (bare || tok.delimiter == Delimiter::Semicolon) {
                break;
            }
            if bare && lower == "loop_" {
                self.parse_loop(&mut frame, tok.line)?;
            } else if bare && tok.text.starts_with('_') {
                self.parse_tag(&mut frame, &tok)?;
            } else {
                return Err(Error::parse(
                    tok.line,
                    format!("unexpected token '{}' in saveframe '{}'", tok.text, name),
                ));
            }
        }
        if frame.tags().is_empty() && !self.options.allow_tagless_saveframes {
            return Err(Error::parse(
                self.source.line(),
                format!(
                    "saveframe '{}' closed without any tags (no tag prefix established)",
                    name
                ),
            ));
        }
        Ok(frame)
    }

    fn parse_tag(&mut self, frame: &mut Saveframe, tag: &Token) -> Result<()> {
        let value = self.next()?.ok_or_else(|| {
            Error::parse(
                tag.line,
                format!("tag '{}' has no value before end of input", tag.text),
            )
        })?;
        if value.delimiter == Delimiter::Bare {
            if is_reserved_value(&value.text) {
                return Err(Error::parse(
                    value.line,
                    format!(
                        "reserved keyword '{}' used unquoted as the value of tag '{}' (missing terminator?)",
                        value.text, tag.text
                    ),
                ));
            }
            if value.text.starts_with('_') {
                return Err(Error::parse(
                    value.line,
                    format!(
                        "value of tag '{}' begins with '_'; quote it, or a value is missing",
                        tag.text
                    ),
                ));
            }
        }
        frame
            .add_tag(&tag.text, value.text)
            .map_err(|e| Error::parse(tag.line, e.to_string()))
    }

    fn parse_loop(&mut self, frame: &mut Saveframe, open_line: usize) -> Result<()> {
        let mut lp = Loop::from_scratch();

        // column declarations run until the first non-tag token
        let mut tok = self.loop_token(frame.name(), open_line)?;
        while tok.delimiter == Delimiter::Bare && tok.text.starts_with('_') {
            lp.add_column(&tok.text)
                .map_err(|e| Error::parse(tok.line, e.to_string()))?;
            tok = self.loop_token(frame.name(), open_line)?;
        }
        if lp.columns().is_empty() {
            self.warn(Warning::new(open_line, "loop with no columns"))?;
        }

        // the loop belongs to its frame from here on; a second loop of the
        // same category is only tolerated under the merge policy
        let merge_target = match lp.category() {
            Some(category) if frame.get_loop(category).is_some() => {
                if !self.options.merge_duplicate_loops {
                    return Err(Error::parse(
                        open_line,
                        format!(
                            "saveframe '{}' already has a loop with category '{}'",
                            frame.name(),
                            category
                        ),
                    ));
                }
                Some(category.to_string())
            }
            _ => None,
        };

        let mut flat: Vec<String> = Vec::new();
        let close_line;
        loop {
            if tok.delimiter == Delimiter::Bare {
                let lower = tok.text.to_ascii_lowercase();
                if lower == "stop_" {
                    close_line = tok.line;
                    break;
                }
                if is_reserved_value(&tok.text) {
                    return Err(Error::parse(
                        tok.line,
                        format!(
                            "reserved keyword '{}' inside loop data (missing 'stop_'?)",
                            tok.text
                        ),
                    ));
                }
                if tok.text.starts_with('_') {
                    return Err(Error::parse(
                        tok.line,
                        "loop columns cannot be declared after data has started",
                    ));
                }
            }
            flat.push(tok.text);
            tok = self.loop_token(frame.name(), open_line)?;
        }

        if flat.is_empty() {
            self.warn(Warning::new(close_line, "loop with no data rows"))?;
        } else if lp.columns().is_empty() {
            return Err(Error::parse(open_line, "loop data with no declared columns"));
        } else {
            lp.add_data(flat)
                .map_err(|e| Error::parse(close_line, e.to_string()))?;
        }

        match merge_target {
            Some(category) => self.merge_loop(frame, &category, lp, open_line),
            None => frame
                .add_loop(lp)
                .map_err(|e| Error::parse(open_line, e.to_string())),
        }
    }

    /// Legacy producer quirk: a repeated loop category appends its rows to
    /// the loop already present, after which an `ID` column (when one
    /// exists) is renumbered so identifiers stay unique.
    fn merge_loop(
        &mut self,
        frame: &mut Saveframe,
        category: &str,
        lp: Loop,
        open_line: usize,
    ) -> Result<()> {
        let existing = frame.get_loop_mut(category).ok_or_else(|| {
            Error::parse(open_line, format!("no loop with category '{}'", category))
        })?;
        let ours: Vec<String> = existing
            .columns()
            .iter()
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let theirs: Vec<String> = lp.columns().iter().map(|c| c.to_ascii_lowercase()).collect();
        if ours != theirs {
            return Err(Error::parse(
                open_line,
                format!(
                    "cannot merge duplicate loops with category '{}': column sets differ",
                    category
                ),
            ));
        }
        for row in lp.rows() {
            existing
                .add_row(row.clone())
                .map_err(|e| Error::parse(open_line, e.to_string()))?;
        }
        if existing.find_column("ID").is_some() {
            existing
                .renumber_rows("ID", 1, false)
                .map_err(|e| Error::parse(open_line, e.to_string()))?;
        }
        self.warn(Warning::new(
            open_line,
            format!("merged a duplicate loop with category '{}'", category),
        ))
    }

    fn loop_token(&mut self, frame: &str, open_line: usize) -> Result<Token> {
        self.next()?.ok_or_else(|| {
            Error::parse(
                self.source.line(),
                format!(
                    "end of input inside the loop opened on line {} in saveframe '{}' (missing 'stop_')",
                    open_line, frame
                ),
            )
        })
    }

    /// Pulls the next token and folds any tokenizer warnings into the
    /// parser's channel (fatal under strict mode).
    fn next(&mut self) -> Result<Option<Token>> {
        let tok = self.source.next_token()?;
        let pending = self.source.take_warnings();
        for warning in pending {
            self.warn(warning)?;
        }
        Ok(tok)
    }

    fn warn(&mut self, warning: Warning) -> Result<()> {
        if self.options.strict {
            return Err(Error::parse(warning.line, warning.message));
        }
        self.warnings.push(warning);
        Ok(())
    }
}
