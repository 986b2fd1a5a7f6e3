//! Value quoting for serialization.
//!
//! [`quote_value`] picks the simplest representation of a value that the
//! tokenizer will read back unchanged, in this precedence order: bare word,
//! single quotes, double quotes, `;`-delimited multi-line block. Values with
//! no safe quoted form (both quote characters each followed by whitespace)
//! fall back to the multi-line form; values containing a line that would
//! start with `;` are re-indented by one space so the embedded line cannot
//! close the block, the single place where round-tripping is not byte-exact.
//!
//! The empty string has no representation: callers map absent values to the
//! configured null literal through [`quote_optional`].

use crate::options::StarOptions;
use crate::token::RESERVED_PREFIXES;
use crate::{Error, Result};

/// A value prepared for emission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuotedValue {
    /// Emit in place, quoting already applied.
    Inline(String),
    /// Emit as a `;`-delimited block; the payload is the content between the
    /// delimiter lines.
    Multiline(String),
}

impl QuotedValue {
    /// Returns `true` for the multi-line form.
    #[inline]
    #[must_use]
    pub fn is_multiline(&self) -> bool {
        matches!(self, QuotedValue::Multiline(_))
    }

    /// Renders the standalone text of this value. The multi-line form is
    /// wrapped in its delimiter lines and must begin at column zero.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            QuotedValue::Inline(s) => s.clone(),
            QuotedValue::Multiline(s) => format!(";\n{}\n;\n", s),
        }
    }

    /// Width the value occupies when emitted inline; multi-line values do
    /// not take part in column alignment.
    pub(crate) fn inline_width(&self) -> usize {
        match self {
            QuotedValue::Inline(s) => s.chars().count(),
            QuotedValue::Multiline(_) => 0,
        }
    }
}

/// Chooses the minimal safe representation for `value`.
///
/// # Errors
///
/// The empty string cannot be represented and returns a
/// [`Formatting`](Error::Formatting) error; map it to a null literal first
/// (see [`quote_optional`]).
///
/// # Examples
///
/// ```rust
/// use nmrstar::quote::quote_value;
/// use nmrstar::StarOptions;
///
/// let options = StarOptions::default();
/// assert_eq!(quote_value("simple", &options).unwrap().render(), "simple");
/// assert_eq!(quote_value("hello world", &options).unwrap().render(), "'hello world'");
/// assert_eq!(quote_value("loop_", &options).unwrap().render(), "'loop_'");
/// ```
pub fn quote_value(value: &str, _options: &StarOptions) -> Result<QuotedValue> {
    if value.is_empty() {
        return Err(Error::formatting(
            "the empty string has no NMR-STAR representation; use a null literal",
        ));
    }

    if value.contains('\n') {
        if value.contains("\n;") || value.starts_with(';') {
            // No line may begin with ';' inside the block
            let escaped = format!(" {}", value.replace('\n', "\n "));
            return Ok(QuotedValue::Multiline(escaped));
        }
        return Ok(QuotedValue::Multiline(value.to_string()));
    }

    let has_single = value.contains('\'');
    let has_double = value.contains('"');

    if has_single && has_double {
        return if wrap_safe(value, b'\'') {
            Ok(QuotedValue::Inline(format!("'{}'", value)))
        } else if wrap_safe(value, b'"') {
            Ok(QuotedValue::Inline(format!("\"{}\"", value)))
        } else {
            Ok(QuotedValue::Multiline(value.to_string()))
        };
    }

    if needs_quoting(value) {
        // A value holding one quote kind takes the other; the tokenizer only
        // closes on a quote followed by whitespace, so the absent kind is
        // always safe.
        return if has_single {
            Ok(QuotedValue::Inline(format!("\"{}\"", value)))
        } else {
            Ok(QuotedValue::Inline(format!("'{}'", value)))
        };
    }

    Ok(QuotedValue::Inline(value.to_string()))
}

/// Maps an absent value to the configured null literal, otherwise defers to
/// [`quote_value`].
///
/// # Examples
///
/// ```rust
/// use nmrstar::quote::quote_optional;
/// use nmrstar::StarOptions;
///
/// let options = StarOptions::default();
/// assert_eq!(quote_optional(None, &options).unwrap().render(), ".");
/// ```
pub fn quote_optional(value: Option<&str>, options: &StarOptions) -> Result<QuotedValue> {
    match value {
        Some(v) => quote_value(v, options),
        None => Ok(QuotedValue::Inline(options.null_literal.clone())),
    }
}

/// A single-line value must be quoted when it holds whitespace or `#`, when
/// it starts like a keyword or a tag, or when its first character is a quote.
fn needs_quoting(value: &str) -> bool {
    if value
        .chars()
        .any(|c| matches!(c, ' ' | '\t' | '\u{0B}'))
    {
        return true;
    }
    if value.contains('#') {
        return true;
    }
    let lower = value.to_ascii_lowercase();
    if RESERVED_PREFIXES.iter().any(|kw| lower.starts_with(kw)) {
        return true;
    }
    value.starts_with('_') || value.starts_with('\'') || value.starts_with('"')
}

/// Wrapping in `quote` is safe when no occurrence of that character inside
/// the value is followed by whitespace (the tokenizer's close condition).
fn wrap_safe(value: &str, quote: u8) -> bool {
    let bytes = value.as_bytes();
    for i in 0..bytes.len() {
        if bytes[i] == quote {
            if let Some(&next) = bytes.get(i + 1) {
                if matches!(next, b' ' | b'\t' | 0x0B) {
                    return false;
                }
            }
        }
    }
    true
}

/// Splits a tag or column reference into its optional category prefix and
/// bare name: `_Entry.Title` gives `(Some("_Entry"), "Title")`, `Title` and
/// `_Title` both give `(None, "Title")`.
pub(crate) fn split_tag(name: &str) -> (Option<&str>, &str) {
    match name.find('.') {
        Some(idx) => (Some(&name[..idx]), &name[idx + 1..]),
        None => (None, name.strip_prefix('_').unwrap_or(name)),
    }
}
