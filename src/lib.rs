//! tola-htmldiff - Word-granularity HTML diff
//!
//! Compares two HTML documents and returns the new document with changed
//! text wrapped in `<ins>`/`<del>` markers:
//!
//! - `<ins class="diffins">` / `<del class="diffdel">`: pure insertion / deletion
//! - `<del class="diffmod">…</del><ins class="diffmod">…</ins>`: replacement
//!
//! Tags are never split by markers. With block diff enabled, a top-level
//! block whose type changed (a list rewritten as a paragraph, say) is marked
//! as a whole rather than word by word.
//!
//! ## Modules
//! - `token` / `tokenizer`: HTML to token stream
//! - `expr`: atomic token patterns
//! - `block`: top-level block analysis
//! - `algo`: matching, edit script, block alignment
//! - `render`: marker rendering
//! - `diff`: engine entry points and options
//! - `batch`: many independent diffs at once
//!
//! ## Usage
//!
//! ```ignore
//! use tola_htmldiff::{diff_with_options, DiffOptions};
//!
//! let html = diff_with_options(
//!     "<p>Ensure adequate hydulation.</p>",
//!     "<p>Ensure adequate hydration.</p>",
//!     &DiffOptions::block_aware(),
//! )?;
//! ```

#[macro_use]
mod tracing_macros;

// =============================================================================
// Modules
// =============================================================================

/// Tokens and token helpers
pub mod token;

/// HTML tokenizer
pub mod tokenizer;

/// Atomic token patterns
pub mod expr;

/// Block-level element analysis
pub mod block;

/// Algorithms: matching, edit script, block alignment
pub mod algo;

/// Marker rendering
pub mod render;

/// Diff engine
pub mod diff;

/// Batch diffing
pub mod batch;

/// Error types
pub mod error;

/// Prelude for common imports
pub mod prelude;

// =============================================================================
// Re-exports
// =============================================================================

// Entry points
pub use diff::{diff, diff_with_options, DiffOptions, DiffStats, EditScript, HtmlDiff};
pub use batch::diff_batch;

// Configuration
pub use block::{BlockDiffConfig, DEFAULT_BLOCK_ELEMENTS};
pub use expr::BlockExpression;

// Tokens
pub use token::{Token, TokenKind};
pub use tokenizer::tokenize;

// Edit script
pub use algo::{Action, Operation};

// Error types
pub use error::{DiffError, DiffResult, Side};
