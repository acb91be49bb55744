//! Longest common token run search
//!
//! [`MatchFinder`] looks for the longest run of consecutive token groups that
//! appears identically in an old and a new index window. A group is
//! `granularity` consecutive tokens; groups slide one token at a time.
//!
//! # Algorithm
//!
//! 1. Index every group of the new window by its joined comparison key
//! 2. Drop groups that repeat more often than the accuracy threshold allows
//! 3. Walk the old window, extending runs through `match_length_at`
//!    (run length ending at each new position, carried from the previous
//!    old position)
//!
//! Ties keep the first run found, i.e. the earliest position in old and then
//! in new.
//!
//! # Complexity
//!
//! - Time: O(n * k) where k is the number of candidates per group
//! - Space: O(m) for the group index

use std::ops::Range;

use compact_str::CompactString;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::token::Token;

/// Separator between token keys of a group; never produced by the tokenizer.
const GROUP_SEPARATOR: char = '\u{1}';

// =============================================================================
// Match
// =============================================================================

/// Run of `size` tokens identical in old and new.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub start_in_old: usize,
    pub start_in_new: usize,
    pub size: usize,
}

impl Match {
    #[inline]
    pub const fn new(start_in_old: usize, start_in_new: usize, size: usize) -> Self {
        Self {
            start_in_old,
            start_in_new,
            size,
        }
    }

    /// Zero-size match anchored at the end of both sequences.
    #[inline]
    pub const fn sentinel(old_len: usize, new_len: usize) -> Self {
        Self::new(old_len, new_len, 0)
    }

    #[inline]
    pub const fn end_in_old(&self) -> usize {
        self.start_in_old + self.size
    }

    #[inline]
    pub const fn end_in_new(&self) -> usize {
        self.start_in_new + self.size
    }

    pub fn old_range(&self) -> Range<usize> {
        self.start_in_old..self.end_in_old()
    }

    pub fn new_range(&self) -> Range<usize> {
        self.start_in_new..self.end_in_new()
    }
}

// =============================================================================
// MatchOptions
// =============================================================================

/// Parameters of one match search.
///
/// Passed by value into every search; never shared mutably.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOptions {
    /// Tokens per group.
    pub granularity: usize,
    /// Groups occurring more than `window * accuracy` times are not indexed.
    /// Zero disables the cut.
    pub repeating_words_accuracy: f64,
    /// Whether whitespace tokens compare equal regardless of content.
    pub ignore_whitespace_differences: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            granularity: 4,
            repeating_words_accuracy: 1.0,
            ignore_whitespace_differences: false,
        }
    }
}

impl MatchOptions {
    /// Same options at another granularity.
    #[inline]
    pub fn at_granularity(self, granularity: usize) -> Self {
        Self {
            granularity,
            ..self
        }
    }
}

// =============================================================================
// MatchFinder
// =============================================================================

type GroupIndex = FxHashMap<CompactString, SmallVec<[usize; 4]>>;

/// Best-match search over two token windows.
pub struct MatchFinder<'t> {
    old: &'t [Token],
    new: &'t [Token],
    old_range: Range<usize>,
    new_range: Range<usize>,
    options: MatchOptions,
}

impl<'t> MatchFinder<'t> {
    pub fn new(
        old: &'t [Token],
        new: &'t [Token],
        old_range: Range<usize>,
        new_range: Range<usize>,
        options: MatchOptions,
    ) -> Self {
        Self {
            old,
            new,
            old_range,
            new_range,
            options,
        }
    }

    /// Find the longest match, or `None` when no group is shared.
    pub fn find_match(&self) -> Option<Match> {
        let g = self.options.granularity;
        if g == 0
            || self.old_range.start >= self.old_range.end
            || self.new_range.start >= self.new_range.end
            || self.old_range.end > self.old.len()
            || self.new_range.end > self.new.len()
        {
            return None;
        }

        let index = self.index_new_groups();
        if index.is_empty() {
            return None;
        }

        let mut best_old = self.old_range.start;
        let mut best_new = self.new_range.start;
        let mut best_len = 0;

        let mut match_length_at: FxHashMap<usize, usize> = FxHashMap::default();
        let mut key = String::new();

        for end_in_old in self.old_range.clone() {
            if !self.group_key(self.old, self.old_range.start, end_in_old, &mut key) {
                continue;
            }

            let mut next_length_at = FxHashMap::default();
            if let Some(positions) = index.get(key.as_str()) {
                for &end_in_new in positions {
                    let previous = end_in_new
                        .checked_sub(1)
                        .and_then(|p| match_length_at.get(&p))
                        .copied()
                        .unwrap_or(0);
                    let len = previous + 1;
                    next_length_at.insert(end_in_new, len);

                    if len > best_len {
                        best_old = end_in_old + 2 - len - g;
                        best_new = end_in_new + 2 - len - g;
                        best_len = len;
                    }
                }
            }
            match_length_at = next_length_at;
        }

        (best_len > 0).then(|| Match::new(best_old, best_new, best_len + g - 1))
    }

    /// Index groups of the new window by key, keyed at their last token.
    fn index_new_groups(&self) -> GroupIndex {
        let mut index = GroupIndex::default();
        let mut key = String::new();

        for end in self.new_range.clone() {
            if self.group_key(self.new, self.new_range.start, end, &mut key) {
                index
                    .entry(CompactString::from(key.as_str()))
                    .or_default()
                    .push(end);
            }
        }

        let accuracy = self.options.repeating_words_accuracy;
        if accuracy > 0.0 {
            let window = (self.new_range.end - self.new_range.start) as f64;
            let threshold = window * accuracy;
            index.retain(|_, positions| positions.len() as f64 <= threshold);
        }
        index
    }

    /// Write the key of the group ending at `end` into `key`.
    ///
    /// Returns false when the group would start before `window_start`.
    fn group_key(
        &self,
        tokens: &[Token],
        window_start: usize,
        end: usize,
        key: &mut String,
    ) -> bool {
        let g = self.options.granularity;
        if end + 1 < window_start + g {
            return false;
        }
        key.clear();
        for (i, token) in tokens[end + 1 - g..=end].iter().enumerate() {
            if i > 0 {
                key.push(GROUP_SEPARATOR);
            }
            key.push_str(self.normalize(token));
        }
        true
    }

    #[inline]
    fn normalize<'a>(&self, token: &'a Token) -> &'a str {
        if self.options.ignore_whitespace_differences && token.is_whitespace() {
            " "
        } else {
            token.key()
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn find(old: &str, new: &str, granularity: usize) -> Option<Match> {
        let old = tokenize(old, &[]);
        let new = tokenize(new, &[]);
        let options = MatchOptions::default().at_granularity(granularity);
        MatchFinder::new(&old, &new, 0..old.len(), 0..new.len(), options).find_match()
    }

    #[test]
    fn test_match_accessors() {
        let m = Match::new(2, 5, 3);
        assert_eq!(m.end_in_old(), 5);
        assert_eq!(m.end_in_new(), 8);
        assert_eq!(m.old_range(), 2..5);
        assert_eq!(m.new_range(), 5..8);
        assert_eq!(Match::sentinel(4, 6).size, 0);
    }

    #[test]
    fn test_longest_run() {
        // tokens: a _ b _ c _ d   vs   x _ b _ c _ d
        let m = find("a b c d", "x b c d", 1).unwrap();
        assert_eq!(m, Match::new(1, 1, 6));
    }

    #[test]
    fn test_coarse_granularity() {
        let m = find("<p>Ensure adequate hydulation.</p>", "<p>Ensure adequate hydration.</p>", 4)
            .unwrap();
        assert_eq!(m, Match::new(0, 0, 5));
    }

    #[test]
    fn test_granularity_larger_than_window() {
        assert_eq!(find("a b", "a b", 4), None);
    }

    #[test]
    fn test_tie_prefers_earliest() {
        // "a " at the start and " a" at the end are both two tokens long
        let m = find("a x a", "a y a", 1).unwrap();
        assert_eq!(m, Match::new(0, 0, 2));
    }

    #[test]
    fn test_no_shared_group() {
        assert_eq!(find("alpha", "beta", 1), None);
    }

    #[test]
    fn test_empty_and_inverted_windows() {
        let old = tokenize("a b", &[]);
        let new = tokenize("a b", &[]);
        let options = MatchOptions::default().at_granularity(1);
        assert_eq!(MatchFinder::new(&old, &new, 0..0, 0..3, options).find_match(), None);
        assert_eq!(MatchFinder::new(&old, &new, 2..1, 0..3, options).find_match(), None);
        assert_eq!(MatchFinder::new(&old, &new, 0..3, 3..3, options).find_match(), None);
    }

    #[test]
    fn test_windows_respected() {
        let old = tokenize("a b a", &[]);
        let new = tokenize("a", &[]);
        let options = MatchOptions::default().at_granularity(1);
        let m = MatchFinder::new(&old, &new, 1..5, 0..1, options).find_match();
        assert_eq!(m, Some(Match::new(4, 0, 1)));
    }

    #[test]
    fn test_attributes_ignored() {
        let m = find("<p class=\"a\">x</p>", "<p id=\"b\">x</p>", 1).unwrap();
        assert_eq!(m, Match::new(0, 0, 3));
    }

    #[test]
    fn test_ignore_whitespace_differences() {
        let old = tokenize("a  b", &[]);
        let new = tokenize("a\nb", &[]);
        let strict = MatchOptions::default().at_granularity(3);
        assert_eq!(MatchFinder::new(&old, &new, 0..3, 0..3, strict).find_match(), None);

        let loose = MatchOptions {
            ignore_whitespace_differences: true,
            ..strict
        };
        let m = MatchFinder::new(&old, &new, 0..3, 0..3, loose).find_match();
        assert_eq!(m, Some(Match::new(0, 0, 3)));
    }

    #[test]
    fn test_repeating_groups_dropped() {
        let old = tokenize("a a a a", &[]);
        let new = tokenize("a a a a", &[]);
        let options = MatchOptions {
            granularity: 1,
            repeating_words_accuracy: 0.25,
            ignore_whitespace_differences: false,
        };
        // "a" occurs 4 times and " " 3 times in a window of 7; threshold 1.75
        assert_eq!(MatchFinder::new(&old, &new, 0..7, 0..7, options).find_match(), None);
    }

    #[test]
    fn test_zero_accuracy_keeps_all_groups() {
        let old = tokenize("a a a a", &[]);
        let new = tokenize("a a a a", &[]);
        let options = MatchOptions {
            granularity: 1,
            repeating_words_accuracy: 0.0,
            ignore_whitespace_differences: false,
        };
        let m = MatchFinder::new(&old, &new, 0..7, 0..7, options).find_match();
        assert_eq!(m, Some(Match::new(0, 0, 7)));
    }
}
