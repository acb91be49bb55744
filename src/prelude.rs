//! Prelude module for common imports.
//!
//! ```ignore
//! use tola_htmldiff::prelude::*;
//! ```

// Entry points
pub use crate::diff::{diff, diff_with_options, DiffOptions, DiffStats, EditScript, HtmlDiff};
pub use crate::batch::diff_batch;

// Configuration
pub use crate::block::{Block, BlockAnalyzer, BlockDiffConfig};
pub use crate::expr::BlockExpression;

// Tokens
pub use crate::token::{Token, TokenKind};
pub use crate::tokenizer::tokenize;

// Algorithms
pub use crate::algo::{Action, Match, MatchFinder, MatchOptions, Operation};

// Render
pub use crate::render::{DiffClass, Marker};

// Error
pub use crate::error::{DiffError, DiffResult};
