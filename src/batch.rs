//! Batch diffing of independent document pairs.
//!
//! With the `parallel` feature, pairs are diffed on the rayon thread pool.
//! Every pair gets its own tokens and matcher state; only the options are
//! shared, read-only.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::diff::{diff_with_options, DiffOptions};
use crate::error::DiffResult;

/// Diff every `(old, new)` pair, returning results in input order.
#[cfg(feature = "parallel")]
pub fn diff_batch<S>(pairs: &[(S, S)], options: &DiffOptions) -> Vec<DiffResult<String>>
where
    S: AsRef<str> + Sync,
{
    debug!(pairs = pairs.len(), "diffing batch in parallel");
    pairs
        .par_iter()
        .map(|(old, new)| diff_with_options(old.as_ref(), new.as_ref(), options))
        .collect()
}

/// Diff every `(old, new)` pair, returning results in input order.
#[cfg(not(feature = "parallel"))]
pub fn diff_batch<S>(pairs: &[(S, S)], options: &DiffOptions) -> Vec<DiffResult<String>>
where
    S: AsRef<str>,
{
    debug!(pairs = pairs.len(), "diffing batch");
    pairs
        .iter()
        .map(|(old, new)| diff_with_options(old.as_ref(), new.as_ref(), options))
        .collect()
}
