//! Diff algorithms over token sequences.
//!
//! - `matcher`: longest common run search within index windows
//! - `matching`: recursive partitioning into matches, orphan suppression
//! - `operation`: edit script synthesis and partition checks
//! - `align`: weighted block alignment for the block-aware layer

mod align;
mod matcher;
mod matching;
mod operation;

pub use align::{align_blocks, block_changes, block_score, BlockChange, BlockText};
pub use matcher::{Match, MatchFinder, MatchOptions};
pub use matching::{matching_blocks, remove_orphans};
pub use operation::{operations, validate_partition, Action, Operation};
