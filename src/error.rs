//! Error types for NMR-STAR parsing, model mutation and serialization.
//!
//! ## Error Categories
//!
//! - **Parse errors**: malformed input text, always carrying the 1-based line
//!   number of the offending token
//! - **Structural errors**: programmatic misuse of the document model
//!   (duplicate names or categories, mismatched tag prefixes, wrong row width)
//! - **Formatting errors**: a value that cannot be serialized losslessly
//! - **I/O errors**: file reading/writing failures
//!
//! Structural errors are fatal to the offending call only; the document is
//! left in its last valid state. Parse errors abort the whole parse — there
//! is no partial-document recovery.
//!
//! ## Warnings
//!
//! Recoverable parse anomalies (an empty loop, a loop with columns but no
//! data, a sloppy multi-line terminator) are reported through [`Warning`]
//! values collected by the parser rather than raised. Under
//! [`StarOptions::strict`](crate::StarOptions) they escalate to
//! [`Error::Parse`].
//!
//! ## Examples
//!
//! ```rust
//! use nmrstar::{parse_str, Error};
//!
//! let result = parse_str("data_demo\nsave_frame\n_Tag.Name loop_\nsave_\n");
//! assert!(result.is_err());
//!
//! if let Err(Error::Parse { line, .. }) = result {
//!     assert_eq!(line, 3);
//! }
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors that can occur while reading, mutating or
/// writing an NMR-STAR document.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Malformed input text; aborts the parse
    #[error("Parse error on line {line}: {msg}")]
    Parse { line: usize, msg: String },

    /// Programmatic misuse of the document model
    #[error("{msg}")]
    Structural { msg: String },

    /// A name, category or column that is already present
    #[error("'{name}' already exists")]
    AlreadyExists { name: String },

    /// A value that cannot be serialized
    #[error("Cannot format value: {msg}")]
    Formatting { msg: String },

    /// Custom error
    #[error("{0}")]
    Custom(String),
}

impl Error {
    /// Creates a parse error carrying the 1-based line number of the token
    /// that triggered it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nmrstar::Error;
    ///
    /// let err = Error::parse(10, "expected a value");
    /// assert!(err.to_string().contains("line 10"));
    /// ```
    pub fn parse(line: usize, msg: impl Into<String>) -> Self {
        Error::Parse {
            line,
            msg: msg.into(),
        }
    }

    /// Creates a structural error for an invalid document-model mutation.
    pub fn structural(msg: impl Into<String>) -> Self {
        Error::Structural { msg: msg.into() }
    }

    /// Creates an already-exists error for duplicate names, categories or
    /// columns. Callers that want add-if-absent semantics match on this
    /// variant instead of passing an ignore flag.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nmrstar::Error;
    ///
    /// let err = Error::already_exists("frame_1");
    /// assert!(matches!(err, Error::AlreadyExists { .. }));
    /// ```
    pub fn already_exists(name: impl Into<String>) -> Self {
        Error::AlreadyExists { name: name.into() }
    }

    /// Creates a formatting error for a value that has no valid NMR-STAR
    /// representation.
    pub fn formatting(msg: impl Into<String>) -> Self {
        Error::Formatting { msg: msg.into() }
    }

    /// Creates an I/O error for file reading/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

/// A recoverable parse anomaly.
///
/// Warnings are collected by the parser and suppressed by default; strict
/// mode turns each into a fatal [`Error::Parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// 1-based line number the anomaly was detected on.
    pub line: usize,
    /// Human-readable description.
    pub message: String,
}

impl Warning {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Warning {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Warning on line {}: {}", self.line, self.message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
