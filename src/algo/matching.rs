//! Recursive partitioning into matches, and orphan suppression
//!
//! [`matching_blocks`] finds the best match in the full window, then searches
//! the windows before and after it, and so on. Recursion is unrolled onto an
//! explicit stack so adversarial inputs cannot exhaust the call stack.

use std::ops::Range;

use super::matcher::{Match, MatchFinder, MatchOptions};
use crate::token::Token;

/// Work item of the partitioning loop.
enum Step {
    /// Search this pair of windows
    Window {
        old: Range<usize>,
        new: Range<usize>,
    },
    /// Emit a match found earlier (keeps old/new order)
    Emit(Match),
}

/// Collect matches covering `old` and `new`, in order, ending with the
/// zero-size sentinel.
///
/// Each window is searched from `options.granularity` down to 1.
pub fn matching_blocks(old: &[Token], new: &[Token], options: MatchOptions) -> Vec<Match> {
    let mut matches = Vec::new();
    let mut stack = vec![Step::Window {
        old: 0..old.len(),
        new: 0..new.len(),
    }];

    while let Some(step) = stack.pop() {
        let (old_window, new_window) = match step {
            Step::Emit(m) => {
                matches.push(m);
                continue;
            }
            Step::Window { old, new } => (old, new),
        };

        let Some(m) = find_match(old, new, &old_window, &new_window, options) else {
            continue;
        };

        // Pushed in reverse so "before" is processed first
        if m.end_in_old() < old_window.end && m.end_in_new() < new_window.end {
            stack.push(Step::Window {
                old: m.end_in_old()..old_window.end,
                new: m.end_in_new()..new_window.end,
            });
        }
        stack.push(Step::Emit(m));
        if old_window.start < m.start_in_old && new_window.start < m.start_in_new {
            stack.push(Step::Window {
                old: old_window.start..m.start_in_old,
                new: new_window.start..m.start_in_new,
            });
        }
    }

    matches.push(Match::sentinel(old.len(), new.len()));
    debug!(matches = matches.len(), "matching blocks found");
    matches
}

/// Best match in a window, trying coarse granularity first.
fn find_match(
    old: &[Token],
    new: &[Token],
    old_window: &Range<usize>,
    new_window: &Range<usize>,
    options: MatchOptions,
) -> Option<Match> {
    (1..=options.granularity).rev().find_map(|g| {
        MatchFinder::new(
            old,
            new,
            old_window.clone(),
            new_window.clone(),
            options.at_granularity(g),
        )
        .find_match()
    })
}

/// Drop small matches stranded between large changed regions.
///
/// A match touching its predecessor or successor is always kept. Otherwise it
/// survives only if its length in characters exceeds
/// `max(old_gap, new_gap) * threshold`, where the gaps span from the previous
/// match's end to the next match's start. The final match (the sentinel) is
/// always kept.
pub fn remove_orphans(
    matches: &[Match],
    old: &[Token],
    new: &[Token],
    threshold: f64,
) -> Vec<Match> {
    let mut kept = Vec::with_capacity(matches.len());
    let Some((&first, rest)) = matches.split_first() else {
        return kept;
    };

    let mut prev = Match::new(0, 0, 0);
    let mut curr = first;

    for &next in rest {
        let touches_prev =
            prev.end_in_old() == curr.start_in_old && prev.end_in_new() == curr.start_in_new;
        let touches_next =
            curr.end_in_old() == next.start_in_old && curr.end_in_new() == next.start_in_new;

        if touches_prev || touches_next {
            kept.push(curr);
        } else {
            let old_gap = char_len(old, prev.end_in_old()..next.start_in_old);
            let new_gap = char_len(new, prev.end_in_new()..next.start_in_new);
            let own = char_len(new, curr.new_range());

            if own as f64 > old_gap.max(new_gap) as f64 * threshold {
                kept.push(curr);
            } else {
                trace!(?curr, old_gap, new_gap, own, "orphan match dropped");
            }
        }

        prev = curr;
        curr = next;
    }

    kept.push(curr);
    kept
}

fn char_len(tokens: &[Token], range: Range<usize>) -> usize {
    tokens
        .get(range)
        .map_or(0, |slice| slice.iter().map(Token::char_len).sum())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn blocks(old: &str, new: &str) -> Vec<Match> {
        let old = tokenize(old, &[]);
        let new = tokenize(new, &[]);
        let g = 4usize.min(old.len()).min(new.len());
        matching_blocks(&old, &new, MatchOptions::default().at_granularity(g))
    }

    #[test]
    fn test_identical_single_match() {
        let matches = blocks("a b c", "a b c");
        assert_eq!(matches, vec![Match::new(0, 0, 5), Match::sentinel(5, 5)]);
    }

    #[test]
    fn test_matches_ordered_and_disjoint() {
        let matches = blocks(
            "<p>Ensure adequate hydulation.</p>",
            "<p>Ensure adequate hydration.</p>",
        );
        assert_eq!(
            matches,
            vec![Match::new(0, 0, 5), Match::new(6, 6, 2), Match::sentinel(8, 8)]
        );
    }

    #[test]
    fn test_insertion_in_middle() {
        // a _ b   vs   a _ x _ b
        let matches = blocks("a b", "a x b");
        assert_eq!(
            matches,
            vec![Match::new(0, 0, 2), Match::new(2, 4, 1), Match::sentinel(3, 5)]
        );
    }

    #[test]
    fn test_empty_side_yields_sentinel_only() {
        assert_eq!(blocks("", "a b"), vec![Match::sentinel(0, 3)]);
        assert_eq!(blocks("a", ""), vec![Match::sentinel(1, 0)]);
    }

    #[test]
    fn test_deep_input_does_not_overflow() {
        let old: String = (0..1000).map(|i| format!("w{i} x ")).collect();
        let new: String = (0..1000).map(|i| format!("w{i} y ")).collect();
        let matches = blocks(&old, &new);
        assert!(matches.len() > 900);
        assert!(matches.windows(2).all(|w| w[0].end_in_old() <= w[1].start_in_old));
    }

    #[test]
    fn test_orphans_kept_when_touching() {
        let old = tokenize("a b", &[]);
        let new = tokenize("a b", &[]);
        let matches = vec![Match::new(0, 0, 3), Match::sentinel(3, 3)];
        assert_eq!(remove_orphans(&matches, &old, &new, 10.0), matches);
    }

    #[test]
    fn test_orphan_dropped_between_large_gaps() {
        let old = tokenize("first long deleted words the second long deleted words", &[]);
        let new = tokenize("brand new inserted content the other new inserted content", &[]);
        // " the " in both: old 7..10, new 7..10
        let matches = vec![Match::new(7, 7, 3), Match::sentinel(old.len(), new.len())];

        let kept = remove_orphans(&matches, &old, &new, 0.5);
        assert_eq!(kept, vec![Match::sentinel(old.len(), new.len())]);

        let kept = remove_orphans(&matches, &old, &new, 0.0);
        assert_eq!(kept, matches);
    }

    #[test]
    fn test_orphans_empty_input() {
        assert!(remove_orphans(&[], &[], &[], 1.0).is_empty());
    }
}
