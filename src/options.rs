//! Configuration options for NMR-STAR parsing and serialization.
//!
//! All policy knobs live on [`StarOptions`], an explicit value threaded
//! through parse and format calls. There is no process-wide configuration:
//! two documents parsed with different options coexist safely.
//!
//! ## Examples
//!
//! ```rust
//! use nmrstar::{parse_str_with_options, StarOptions};
//!
//! // Strict mode: recoverable anomalies become fatal parse errors
//! let options = StarOptions::new().with_strict(true);
//! let result = parse_str_with_options("data_x\nsave_a\n_T.V 1\nloop_ stop_\nsave_\n", &options);
//! assert!(result.is_err());
//! ```

/// Configuration for parsing and serialization.
///
/// Defaults match the common case: warnings suppressed, duplicate loop
/// categories rejected, empty loops written out as a bare `loop_`/`stop_`
/// pair, and `.` as the null placeholder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StarOptions {
    /// Literal written for an absent value (default `.`).
    pub null_literal: String,
    /// Escalate recoverable parse warnings to fatal errors.
    pub strict: bool,
    /// Legacy-compatibility policy: merge a second loop of an
    /// already-present category into the existing loop instead of rejecting
    /// it. Merging appends rows and sequentially renumbers a column named
    /// `ID` when one exists.
    pub merge_duplicate_loops: bool,
    /// Schema-less/legacy mode: allow a saveframe to close without any tags
    /// (and therefore without an established tag prefix).
    pub allow_tagless_saveframes: bool,
    /// Suppress loops with no columns and no data during serialization
    /// instead of emitting a bare `loop_`/`stop_` pair.
    pub skip_empty_loops: bool,
}

impl Default for StarOptions {
    fn default() -> Self {
        StarOptions {
            null_literal: ".".to_string(),
            strict: false,
            merge_duplicate_loops: false,
            allow_tagless_saveframes: false,
            skip_empty_loops: false,
        }
    }
}

impl StarOptions {
    /// Creates the default options.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nmrstar::StarOptions;
    ///
    /// let options = StarOptions::new();
    /// assert_eq!(options.null_literal, ".");
    /// assert!(!options.strict);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the literal used for absent values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nmrstar::StarOptions;
    ///
    /// let options = StarOptions::new().with_null_literal("?");
    /// assert_eq!(options.null_literal, "?");
    /// ```
    #[must_use]
    pub fn with_null_literal(mut self, literal: impl Into<String>) -> Self {
        self.null_literal = literal.into();
        self
    }

    /// Enables or disables strict mode.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Opts in to the legacy duplicate-loop merge policy.
    ///
    /// Merging silently changes data semantics (row identifier collisions
    /// are renumbered), which is why it is never the default.
    #[must_use]
    pub fn with_merge_duplicate_loops(mut self, merge: bool) -> Self {
        self.merge_duplicate_loops = merge;
        self
    }

    /// Allows saveframes to close without any tags.
    #[must_use]
    pub fn with_allow_tagless_saveframes(mut self, allow: bool) -> Self {
        self.allow_tagless_saveframes = allow;
        self
    }

    /// Suppresses empty loops during serialization.
    #[must_use]
    pub fn with_skip_empty_loops(mut self, skip: bool) -> Self {
        self.skip_empty_loops = skip;
        self
    }
}
