//! Lexical scanning of NMR-STAR text.
//!
//! The [`Tokenizer`] converts raw text into a stream of [`Token`]s, each
//! tagged with the delimiter it was read from and the 1-based line number of
//! its first character. It performs a single forward pass with no
//! backtracking.
//!
//! Reserved keywords (`data_`, `save_`, `loop_`, `stop_`, `global_`) are
//! ordinary tokens at this level; the parser assigns them meaning.
//!
//! ## Usage
//!
//! ```rust
//! use nmrstar::token::{Delimiter, Tokenizer, TokenSource};
//!
//! let mut tokens = Tokenizer::new("data_demo\n_Tag.Name 'a value'\n");
//! let tok = tokens.next_token().unwrap().unwrap();
//! assert_eq!(tok.text, "data_demo");
//! assert_eq!(tok.delimiter, Delimiter::Bare);
//! ```

use crate::{Error, Result, Warning};

/// The reserved keyword prefixes of the format, lower-case.
pub(crate) const RESERVED_PREFIXES: [&str; 5] = ["data_", "save_", "loop_", "stop_", "global_"];

/// Returns `true` if a bare token carries keyword meaning and is therefore
/// illegal as an undelimited data value. Keyword matching is
/// case-insensitive.
pub(crate) fn is_reserved_value(token: &str) -> bool {
    let lower = token.to_ascii_lowercase();
    matches!(lower.as_str(), "loop_" | "stop_" | "global_")
        || lower.starts_with("data_")
        || lower.starts_with("save_")
}

/// How a token was delimited in the source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delimiter {
    /// An unquoted word.
    Bare,
    /// A `'...'` quoted value.
    SingleQuote,
    /// A `"..."` quoted value.
    DoubleQuote,
    /// A `;`-delimited multi-line value.
    Semicolon,
    /// A bare word beginning with `$`, referencing a saveframe by name.
    FramePointer,
}

/// One lexical token: its text (delimiters stripped), how it was delimited,
/// and the line its first character sits on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub delimiter: Delimiter,
    pub line: usize,
}

/// A source of NMR-STAR tokens.
///
/// [`Tokenizer`] is the reference implementation; an alternative (for
/// example a SIMD-accelerated scanner) can implement this trait and be
/// selected at build time, since the parser is generic over it.
pub trait TokenSource {
    /// Produces the next token, or `Ok(None)` at end of input.
    fn next_token(&mut self) -> Result<Option<Token>>;

    /// 1-based line number of the start of the most recently returned token.
    fn line(&self) -> usize;

    /// Drains any warnings accumulated while scanning.
    fn take_warnings(&mut self) -> Vec<Warning> {
        Vec::new()
    }
}

/// The reference single-pass tokenizer.
///
/// Holds a normalized copy of the input: CRLF and bare CR become LF, and a
/// trailing LF is appended so every construct is newline-terminated.
pub struct Tokenizer {
    text: String,
    pos: usize,
    line: usize,
    token_line: usize,
    warnings: Vec<Warning>,
}

impl Tokenizer {
    pub fn new(input: &str) -> Self {
        let mut text = input.replace("\r\n", "\n").replace('\r', "\n");
        if !text.ends_with('\n') {
            text.push('\n');
        }
        Tokenizer {
            text,
            pos: 0,
            line: 1,
            token_line: 1,
            warnings: Vec::new(),
        }
    }

    /// Whitespace for token-boundary purposes: space, tab, newline,
    /// vertical tab.
    #[inline]
    fn is_space(b: u8) -> bool {
        matches!(b, b' ' | b'\t' | b'\n' | 0x0B)
    }

    fn at_line_start(&self) -> bool {
        self.pos == 0 || self.text.as_bytes()[self.pos - 1] == b'\n'
    }

    /// Moves the cursor forward, keeping the line counter in step.
    fn advance_to(&mut self, new_pos: usize) {
        for &b in &self.text.as_bytes()[self.pos..new_pos] {
            if b == b'\n' {
                self.line += 1;
            }
        }
        self.pos = new_pos;
    }

    fn scan(&mut self) -> Result<Option<Token>> {
        loop {
            while self.pos < self.text.len() {
                let b = self.text.as_bytes()[self.pos];
                if !Self::is_space(b) {
                    break;
                }
                if b == b'\n' {
                    self.line += 1;
                }
                self.pos += 1;
            }
            if self.pos >= self.text.len() {
                return Ok(None);
            }
            // a '#' at token-start position opens a comment to end of line
            if self.text.as_bytes()[self.pos] == b'#' {
                while self.pos < self.text.len() && self.text.as_bytes()[self.pos] != b'\n' {
                    self.pos += 1;
                }
                continue;
            }
            break;
        }
        self.token_line = self.line;
        match self.text.as_bytes()[self.pos] {
            b';' if self.at_line_start() => self.scan_multiline(),
            q @ (b'\'' | b'"') => self.scan_quoted(q),
            _ => Ok(Some(self.scan_bare())),
        }
    }

    /// Scans a `;`-delimited multi-line value. The cursor sits on a `;` at
    /// line start. Content runs to the next line beginning with `;`; the
    /// final newline belongs to the delimiter, as does one leading newline
    /// when the opening `;` ends its own line.
    fn scan_multiline(&mut self) -> Result<Option<Token>> {
        let content_start = self.pos + 1;
        let idx = match self.text[content_start..].find("\n;") {
            Some(idx) => idx,
            None => {
                return Err(Error::parse(
                    self.token_line,
                    "unterminated multi-line value (no closing ';' line)",
                ))
            }
        };
        let mut content = &self.text[content_start..content_start + idx];
        if let Some(stripped) = content.strip_prefix('\n') {
            content = stripped;
        }
        let content = content.to_string();

        let close = content_start + idx + 2; // just past the closing ';'
        let malformed = close < self.text.len() && !Self::is_space(self.text.as_bytes()[close]);
        self.advance_to(close);
        if malformed {
            self.warnings.push(Warning::new(
                self.line,
                "data directly after the closing ';' of a multi-line value",
            ));
            // tolerate the malformed terminator: drop the rest of its line
            while self.pos < self.text.len() && self.text.as_bytes()[self.pos] != b'\n' {
                self.pos += 1;
            }
        }
        Ok(Some(Token {
            text: content,
            delimiter: Delimiter::Semicolon,
            line: self.token_line,
        }))
    }

    /// Scans a quoted value. The closing quote is the first matching quote
    /// character immediately followed by whitespace or end of line; embedded
    /// quote characters followed by anything else are content.
    fn scan_quoted(&mut self, quote: u8) -> Result<Option<Token>> {
        let bytes = self.text.as_bytes();
        let start = self.pos + 1;
        let mut i = start;
        while i < bytes.len() {
            let b = bytes[i];
            if b == b'\n' {
                return Err(Error::parse(
                    self.token_line,
                    format!(
                        "quoted value not terminated before end of line (missing closing {})",
                        quote as char
                    ),
                ));
            }
            if b == quote && bytes.get(i + 1).copied().map_or(true, Self::is_space) {
                let text = self.text[start..i].to_string();
                let delimiter = if quote == b'\'' {
                    Delimiter::SingleQuote
                } else {
                    Delimiter::DoubleQuote
                };
                self.pos = i + 1;
                return Ok(Some(Token {
                    text,
                    delimiter,
                    line: self.token_line,
                }));
            }
            i += 1;
        }
        Err(Error::parse(self.token_line, "unterminated quoted value"))
    }

    /// Scans a bare word: everything up to the next whitespace character.
    fn scan_bare(&mut self) -> Token {
        let bytes = self.text.as_bytes();
        let start = self.pos;
        let mut i = start;
        while i < bytes.len() && !Self::is_space(bytes[i]) {
            i += 1;
        }
        let text = self.text[start..i].to_string();
        self.pos = i;
        let delimiter = if text.starts_with('$') {
            Delimiter::FramePointer
        } else {
            Delimiter::Bare
        };
        Token {
            text,
            delimiter,
            line: self.token_line,
        }
    }
}

impl TokenSource for Tokenizer {
    fn next_token(&mut self) -> Result<Option<Token>> {
        self.scan()
    }

    fn line(&self) -> usize {
        self.token_line
    }

    fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_tokens(input: &str) -> Vec<Token> {
        let mut tokens = Tokenizer::new(input);
        let mut out = Vec::new();
        while let Some(tok) = tokens.next_token().unwrap() {
            out.push(tok);
        }
        out
    }

    #[test]
    fn test_bare_tokens_and_lines() {
        let toks = all_tokens("data_x\n  save_one\nvalue");
        assert_eq!(toks.len(), 3);
        assert_eq!(toks[0].text, "data_x");
        assert_eq!(toks[0].line, 1);
        assert_eq!(toks[1].text, "save_one");
        assert_eq!(toks[1].line, 2);
        assert_eq!(toks[2].line, 3);
        assert!(toks.iter().all(|t| t.delimiter == Delimiter::Bare));
    }

    #[test]
    fn test_comments_are_skipped() {
        let toks = all_tokens("# header comment\nvalue # trailing\nnext");
        let texts: Vec<_> = toks.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["value", "next"]);
    }

    #[test]
    fn test_quoted_with_embedded_quote() {
        let toks = all_tokens("'don't stop' end");
        assert_eq!(toks[0].text, "don't stop");
        assert_eq!(toks[0].delimiter, Delimiter::SingleQuote);
        assert_eq!(toks[1].text, "end");
    }

    #[test]
    fn test_double_quoted() {
        let toks = all_tokens("\"hello world\"");
        assert_eq!(toks[0].text, "hello world");
        assert_eq!(toks[0].delimiter, Delimiter::DoubleQuote);
    }

    #[test]
    fn test_unterminated_quote_is_fatal() {
        let mut tokens = Tokenizer::new("'no closing quote\n");
        let err = tokens.next_token().unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn test_multiline_value() {
        let toks = all_tokens(";\nline one\nline two\n;\nafter");
        assert_eq!(toks[0].text, "line one\nline two");
        assert_eq!(toks[0].delimiter, Delimiter::Semicolon);
        assert_eq!(toks[1].text, "after");
        assert_eq!(toks[1].line, 5);
    }

    #[test]
    fn test_multiline_same_line_content() {
        let toks = all_tokens(";starts here\nmore\n;\n");
        assert_eq!(toks[0].text, "starts here\nmore");
    }

    #[test]
    fn test_unterminated_multiline_is_fatal() {
        let mut tokens = Tokenizer::new("tag\n;\nnever closed\n");
        tokens.next_token().unwrap();
        let err = tokens.next_token().unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
    }

    #[test]
    fn test_malformed_terminator_warns() {
        let mut tokens = Tokenizer::new(";\ncontent\n;junk\n");
        let tok = tokens.next_token().unwrap().unwrap();
        assert_eq!(tok.text, "content");
        let warnings = tokens.take_warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].line, 3);
    }

    #[test]
    fn test_semicolon_mid_line_is_bare() {
        let toks = all_tokens("abc ;def\n");
        assert_eq!(toks[1].text, ";def");
        assert_eq!(toks[1].delimiter, Delimiter::Bare);
    }

    #[test]
    fn test_frame_pointer_delimiter() {
        let toks = all_tokens("$sample_one");
        assert_eq!(toks[0].text, "$sample_one");
        assert_eq!(toks[0].delimiter, Delimiter::FramePointer);
    }

    #[test]
    fn test_crlf_normalization() {
        let toks = all_tokens("data_x\r\n;\r\na\r\n;\r\n");
        assert_eq!(toks[0].text, "data_x");
        assert_eq!(toks[1].text, "a");
    }

    #[test]
    fn test_reserved_value_detection() {
        assert!(is_reserved_value("loop_"));
        assert!(is_reserved_value("STOP_"));
        assert!(is_reserved_value("save_anything"));
        assert!(is_reserved_value("data_x"));
        assert!(!is_reserved_value("looped"));
        assert!(!is_reserved_value("value"));
    }
}
