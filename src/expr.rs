//! Atomic token overrides (`blocksExpression`)
//!
//! A [`BlockExpression`] marks text that must be treated as a single opaque
//! token, e.g. dates or template placeholders that should never be diffed
//! word-by-word. Matches are found before generic tokenization.

use compact_str::CompactString;
use regex::Regex;

use crate::error::{DiffError, DiffResult};

/// Pattern whose matches become one atomic token each.
#[derive(Debug, Clone)]
pub struct BlockExpression {
    pattern: Regex,
    compare_by: Option<Regex>,
}

impl BlockExpression {
    /// Compile an expression from a pattern string.
    pub fn new(pattern: &str) -> DiffResult<Self> {
        let pattern = Regex::new(pattern).map_err(|e| DiffError::invalid_pattern(pattern, e))?;
        Ok(Self::from_regex(pattern))
    }

    /// Wrap an already-compiled regex.
    pub fn from_regex(pattern: Regex) -> Self {
        Self {
            pattern,
            compare_by: None,
        }
    }

    /// Compare atomic tokens by the first match of `compare_by` inside them
    /// instead of their full text.
    pub fn with_compare_by(mut self, compare_by: &str) -> DiffResult<Self> {
        let regex =
            Regex::new(compare_by).map_err(|e| DiffError::invalid_pattern(compare_by, e))?;
        self.compare_by = Some(regex);
        Ok(self)
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn compare_by(&self) -> Option<&Regex> {
        self.compare_by.as_ref()
    }

    /// Comparison key for matched `text`.
    fn compare_key(&self, text: &str) -> Option<CompactString> {
        let regex = self.compare_by.as_ref()?;
        regex.find(text).map(|m| CompactString::from(m.as_str()))
    }
}

/// Byte span of an atomic token in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AtomicSpan {
    pub start: usize,
    pub end: usize,
    pub compare: Option<CompactString>,
}

/// Collect non-overlapping atomic spans, sorted by start.
///
/// Earlier expressions take precedence; a later match overlapping an
/// accepted span is discarded. Empty matches are ignored.
pub(crate) fn atomic_spans(html: &str, expressions: &[BlockExpression]) -> Vec<AtomicSpan> {
    let mut spans: Vec<AtomicSpan> = Vec::new();
    for expr in expressions {
        for m in expr.pattern.find_iter(html) {
            if m.start() == m.end() {
                continue;
            }
            let overlaps = spans
                .iter()
                .any(|s| m.start() < s.end && s.start < m.end());
            if overlaps {
                continue;
            }
            spans.push(AtomicSpan {
                start: m.start(),
                end: m.end(),
                compare: expr.compare_key(m.as_str()),
            });
        }
    }
    spans.sort_by_key(|s| s.start);
    spans
}
