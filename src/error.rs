//! Error types for tola-htmldiff.
//!
//! Malformed HTML is never an error: the tokenizer degrades to literal text.
//! Errors are raised for invalid caller-supplied patterns and for broken
//! internal invariants of the edit script.

use thiserror::Error;

/// Which token sequence an invariant violation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Old,
    New,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Old => f.write_str("old"),
            Side::New => f.write_str("new"),
        }
    }
}

/// Errors that can occur while building a diff.
#[derive(Debug, Error)]
pub enum DiffError {
    /// A `blocksExpression` pattern failed to compile
    #[error("invalid block expression `{pattern}`: {source}")]
    InvalidPattern {
        /// The pattern as supplied by the caller
        pattern: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },

    /// The edit script does not cover the token range exactly once
    #[error("operations do not partition the {side} tokens: expected position {expected}, found {found}")]
    BrokenPartition {
        /// Token sequence with the gap or overlap
        side: Side,
        /// Position the next operation should have started at (or total length)
        expected: usize,
        /// Position actually found
        found: usize,
    },

    /// An `equal` operation with an empty range reached the renderer
    #[error("empty match at old={start_in_old}, new={start_in_new}")]
    EmptyMatch {
        /// Start of the match in the old tokens
        start_in_old: usize,
        /// Start of the match in the new tokens
        start_in_new: usize,
    },
}

/// Result type alias for diff operations.
pub type DiffResult<T> = Result<T, DiffError>;

impl DiffError {
    /// Create a pattern error from a failed regex compilation.
    pub fn invalid_pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            source,
        }
    }
}
