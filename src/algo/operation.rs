//! Edit script synthesis
//!
//! Turns an ordered match list into [`Operation`]s that cover every old and
//! every new token exactly once.

use std::ops::Range;

use super::matcher::Match;
use crate::error::{DiffError, DiffResult, Side};

/// Kind of an edit operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Equal,
    Delete,
    Insert,
    Replace,
    /// No gap before a match; never emitted into an edit script
    None,
}

/// One entry of the edit script over old/new token ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub action: Action,
    pub start_in_old: usize,
    pub end_in_old: usize,
    pub start_in_new: usize,
    pub end_in_new: usize,
}

impl Operation {
    pub const fn new(
        action: Action,
        start_in_old: usize,
        end_in_old: usize,
        start_in_new: usize,
        end_in_new: usize,
    ) -> Self {
        Self {
            action,
            start_in_old,
            end_in_old,
            start_in_new,
            end_in_new,
        }
    }

    pub fn old_range(&self) -> Range<usize> {
        self.start_in_old..self.end_in_old
    }

    pub fn new_range(&self) -> Range<usize> {
        self.start_in_new..self.end_in_new
    }
}

/// Build the edit script from matches ending with the sentinel.
pub fn operations(matches: &[Match]) -> Vec<Operation> {
    let mut ops = Vec::with_capacity(matches.len() * 2);
    let mut position_in_old = 0;
    let mut position_in_new = 0;

    for m in matches {
        let at_old = position_in_old == m.start_in_old;
        let at_new = position_in_new == m.start_in_new;

        let action = match (at_old, at_new) {
            (true, true) => Action::None,
            (true, false) => Action::Insert,
            (false, true) => Action::Delete,
            (false, false) => Action::Replace,
        };

        if action != Action::None {
            ops.push(Operation::new(
                action,
                position_in_old,
                m.start_in_old,
                position_in_new,
                m.start_in_new,
            ));
        }
        if m.size != 0 {
            ops.push(Operation::new(
                Action::Equal,
                m.start_in_old,
                m.end_in_old(),
                m.start_in_new,
                m.end_in_new(),
            ));
        }

        position_in_old = m.end_in_old();
        position_in_new = m.end_in_new();
    }

    ops
}

/// Check that `ops` partition `[0, old_len)` and `[0, new_len)`.
pub fn validate_partition(ops: &[Operation], old_len: usize, new_len: usize) -> DiffResult<()> {
    let mut old_cursor = 0;
    let mut new_cursor = 0;

    for op in ops {
        check_step(Side::Old, old_cursor, op.start_in_old, op.end_in_old)?;
        check_step(Side::New, new_cursor, op.start_in_new, op.end_in_new)?;

        let empty = op.old_range().is_empty() && op.new_range().is_empty();
        if op.action == Action::Equal && (empty || op.old_range().len() != op.new_range().len()) {
            return Err(DiffError::EmptyMatch {
                start_in_old: op.start_in_old,
                start_in_new: op.start_in_new,
            });
        }

        old_cursor = op.end_in_old;
        new_cursor = op.end_in_new;
    }

    if old_cursor != old_len {
        return Err(DiffError::BrokenPartition {
            side: Side::Old,
            expected: old_len,
            found: old_cursor,
        });
    }
    if new_cursor != new_len {
        return Err(DiffError::BrokenPartition {
            side: Side::New,
            expected: new_len,
            found: new_cursor,
        });
    }
    Ok(())
}

fn check_step(side: Side, cursor: usize, start: usize, end: usize) -> DiffResult<()> {
    if start != cursor {
        return Err(DiffError::BrokenPartition {
            side,
            expected: cursor,
            found: start,
        });
    }
    if end < start {
        return Err(DiffError::BrokenPartition {
            side,
            expected: start,
            found: end,
        });
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
