//! Block alignment for the block-aware diff layer
//!
//! Pairs top-level blocks of the old and new documents with a weighted
//! longest common subsequence, then reports the unpaired stretches whose
//! block structure changed (e.g. a list turned into a paragraph). Those
//! stretches render as whole-block deletion plus insertion.
//!
//! # Scoring
//!
//! Blocks of different type score 0 and never pair. Blocks of the same type
//! score `100 - round(100 * |len_old - len_new| / max(len_old, len_new))`
//! over their inner content length in characters (100 when both are empty).
//! Among alignments with the same total score, the one pairing more blocks
//! with identical inner content wins.
//!
//! # Complexity
//!
//! - Time: O(n * m) over the block counts
//! - Space: O(n * m) for the score and DP tables

use std::ops::Range;

use crate::block::{Block, BlockAnalyzer};
use crate::token::Token;

/// Block stretch that changed structure, with the token ranges to replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockChange {
    /// Indices into the old block list
    pub old_blocks: Range<usize>,
    /// Indices into the new block list
    pub new_blocks: Range<usize>,
    /// Old tokens rendered as deleted
    pub old_tokens: Range<usize>,
    /// New tokens rendered as inserted
    pub new_tokens: Range<usize>,
}

/// Pairing score of two blocks in `0..=100`.
pub fn block_score(analyzer: &BlockAnalyzer<'_>, old: &BlockText<'_>, new: &BlockText<'_>) -> u32 {
    if !analyzer.is_same_block_type(Some(old.block), Some(new.block)) {
        return 0;
    }
    let longest = old.len.max(new.len);
    if longest == 0 {
        return 100;
    }
    let diff = old.len.abs_diff(new.len) as f64;
    let penalty = (100.0 * diff / longest as f64).round() as u32;
    100 - penalty.min(100)
}

/// A block with its inner content measured once.
#[derive(Debug, Clone)]
pub struct BlockText<'b> {
    pub block: &'b Block,
    pub inner: String,
    pub len: usize,
}

impl<'b> BlockText<'b> {
    pub fn new(analyzer: &BlockAnalyzer<'_>, tokens: &[Token], block: &'b Block) -> Self {
        let inner = analyzer.inner_content(tokens, block);
        let len = inner.chars().count();
        Self { block, inner, len }
    }
}

/// DP cell: total score, then number of identical pairs.
type Value = (u32, u32);

/// Pair blocks by weighted LCS; returns `(old_index, new_index)` anchors in
/// increasing order on both sides.
pub fn align_blocks(
    analyzer: &BlockAnalyzer<'_>,
    old: &[BlockText<'_>],
    new: &[BlockText<'_>],
) -> Vec<(usize, usize)> {
    let n = old.len();
    let m = new.len();
    if n == 0 || m == 0 {
        return Vec::new();
    }

    // pair[i * m + j] = (score, identical)
    let mut pair = vec![(0u32, 0u32); n * m];
    for (i, a) in old.iter().enumerate() {
        for (j, b) in new.iter().enumerate() {
            let score = block_score(analyzer, a, b);
            let identical = u32::from(score > 0 && a.inner == b.inner);
            pair[i * m + j] = (score, identical);
        }
    }

    // dp[i][j] = best value aligning old[i..] with new[j..]
    let width = m + 1;
    let mut dp: Vec<Value> = vec![(0, 0); (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            let mut best = dp[(i + 1) * width + j].max(dp[i * width + j + 1]);
            let (score, identical) = pair[i * m + j];
            if score > 0 {
                let (s, e) = dp[(i + 1) * width + j + 1];
                best = best.max((s + score, e + identical));
            }
            dp[i * width + j] = best;
        }
    }

    // Backtrack greedily from the front
    let mut anchors = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        let (score, identical) = pair[i * m + j];
        let (s, e) = dp[(i + 1) * width + j + 1];
        if score > 0 && (s + score, e + identical) == dp[i * width + j] {
            anchors.push((i, j));
            i += 1;
            j += 1;
        } else if dp[(i + 1) * width + j] >= dp[i * width + j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }

    anchors
}

/// Detect structural changes between anchored blocks.
///
/// Each gap between consecutive anchors (and before the first / after the
/// last) is left to word-level diffing when both sides hold the same number
/// of blocks with pairwise matching types. Otherwise the gap becomes a
/// [`BlockChange`].
pub fn block_changes(
    analyzer: &BlockAnalyzer<'_>,
    old_tokens: &[Token],
    old_blocks: &[Block],
    new_tokens: &[Token],
    new_blocks: &[Block],
) -> Vec<BlockChange> {
    let old_text: Vec<_> = old_blocks
        .iter()
        .map(|b| BlockText::new(analyzer, old_tokens, b))
        .collect();
    let new_text: Vec<_> = new_blocks
        .iter()
        .map(|b| BlockText::new(analyzer, new_tokens, b))
        .collect();
    let anchors = align_blocks(analyzer, &old_text, &new_text);

    let mut changes = Vec::new();
    let mut prev: Option<(usize, usize)> = None;
    let ends = anchors
        .iter()
        .copied()
        .map(Some)
        .chain(std::iter::once(None));

    for next in ends {
        let old_gap = prev.map_or(0, |(o, _)| o + 1)..next.map_or(old_blocks.len(), |(o, _)| o);
        let new_gap = prev.map_or(0, |(_, n)| n + 1)..next.map_or(new_blocks.len(), |(_, n)| n);

        if !gap_is_stable(analyzer, &old_blocks[old_gap.clone()], &new_blocks[new_gap.clone()]) {
            let bounds = GapBounds {
                old: prev.map_or(0, |(o, _)| old_blocks[o].end + 1)
                    ..next.map_or(old_tokens.len(), |(o, _)| old_blocks[o].start),
                new: prev.map_or(0, |(_, n)| new_blocks[n].end + 1)
                    ..next.map_or(new_tokens.len(), |(_, n)| new_blocks[n].start),
            };
            let (old_range, new_range) = token_ranges(
                old_tokens,
                &old_blocks[old_gap.clone()],
                new_tokens,
                &new_blocks[new_gap.clone()],
                &bounds,
            );
            debug!(?old_gap, ?new_gap, ?old_range, ?new_range, "block structure changed");
            changes.push(BlockChange {
                old_blocks: old_gap,
                new_blocks: new_gap,
                old_tokens: old_range,
                new_tokens: new_range,
            });
        }
        prev = next;
    }

    changes
}

/// Whether a gap keeps its block structure.
fn gap_is_stable(analyzer: &BlockAnalyzer<'_>, old: &[Block], new: &[Block]) -> bool {
    old.len() == new.len()
        && old
            .iter()
            .zip(new)
            .all(|(a, b)| analyzer.is_same_block_type(Some(a), Some(b)))
}

/// Token span between the surrounding anchors on each side.
struct GapBounds {
    old: Range<usize>,
    new: Range<usize>,
}

/// Token ranges of a changed gap.
///
/// With blocks on both sides, each range spans from the first block's opening
/// tag to the last block's closing tag. With blocks on one side only, the
/// empty side is positioned before the inter-block text it shares with the
/// other side's trailing text, so text differing on both sides is diffed
/// ahead of the change. The non-empty range absorbs trailing text the other
/// side lacks.
fn token_ranges(
    old_tokens: &[Token],
    old_blocks: &[Block],
    new_tokens: &[Token],
    new_blocks: &[Block],
    bounds: &GapBounds,
) -> (Range<usize>, Range<usize>) {
    let old_ends = old_blocks.first().zip(old_blocks.last());
    let new_ends = new_blocks.first().zip(new_blocks.last());

    match (old_ends, new_ends) {
        (Some((first, last)), Some((new_first, new_last))) => {
            (first.start..last.end + 1, new_first.start..new_last.end + 1)
        }
        (None, Some((first, last))) => {
            let (empty, span) =
                one_sided(old_tokens, &bounds.old, new_tokens, &bounds.new, first, last);
            (empty, span)
        }
        (Some((first, last)), None) => {
            let (empty, span) =
                one_sided(new_tokens, &bounds.new, old_tokens, &bounds.old, first, last);
            (span, empty)
        }
        (None, None) => (
            bounds.old.start..bounds.old.start,
            bounds.new.start..bounds.new.start,
        ),
    }
}

/// Place a one-sided change. `empty_*` is the side without blocks.
fn one_sided(
    empty_tokens: &[Token],
    empty_bounds: &Range<usize>,
    full_tokens: &[Token],
    full_bounds: &Range<usize>,
    first: &Block,
    last: &Block,
) -> (Range<usize>, Range<usize>) {
    let empty_text = &empty_tokens[empty_bounds.clone()];
    let leading = &full_tokens[full_bounds.start..first.start];
    let prefix = common_prefix(empty_text, leading);

    let trailing = &full_tokens[last.end + 1..full_bounds.end];
    let suffix = common_suffix(&empty_text[prefix..], trailing);
    let position = empty_bounds.end - suffix;

    (position..position, first.start..full_bounds.end - suffix)
}

fn common_prefix(a: &[Token], b: &[Token]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x.key() == y.key()).count()
}

fn common_suffix(a: &[Token], b: &[Token]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x.key() == y.key())
        .count()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockDiffConfig;
    use crate::tokenizer::tokenize;

    struct Doc {
        tokens: Vec<Token>,
        blocks: Vec<Block>,
    }

    fn doc(config: &BlockDiffConfig, html: &str) -> Doc {
        let tokens = tokenize(html, &[]);
        let blocks = BlockAnalyzer::new(config).analyze(&tokens);
        Doc { tokens, blocks }
    }

    fn changes(config: &BlockDiffConfig, old: &str, new: &str) -> (Doc, Doc, Vec<BlockChange>) {
        let analyzer = BlockAnalyzer::new(config);
        let old = doc(config, old);
        let new = doc(config, new);
        let found = block_changes(&analyzer, &old.tokens, &old.blocks, &new.tokens, &new.blocks);
        (old, new, found)
    }

    fn texts<'d>(analyzer: &BlockAnalyzer<'_>, doc: &'d Doc) -> Vec<BlockText<'d>> {
        doc.blocks
            .iter()
            .map(|b| BlockText::new(analyzer, &doc.tokens, b))
            .collect()
    }

    fn text(tokens: &[Token], range: Range<usize>) -> String {
        crate::token::join(&tokens[range])
    }

    #[test]
    fn test_score() {
        let config = BlockDiffConfig::enabled();
        let analyzer = BlockAnalyzer::new(&config);
        let d = doc(&config, "<p>abcd</p><p>ab</p><p></p><ul></ul><div>abcd</div>");
        let t: Vec<_> = d
            .blocks
            .iter()
            .map(|b| BlockText::new(&analyzer, &d.tokens, b))
            .collect();

        assert_eq!(block_score(&analyzer, &t[0], &t[0]), 100);
        assert_eq!(block_score(&analyzer, &t[0], &t[1]), 50);
        assert_eq!(block_score(&analyzer, &t[1], &t[2]), 0);
        assert_eq!(block_score(&analyzer, &t[2], &t[2]), 100);
        assert_eq!(block_score(&analyzer, &t[3], &t[3]), 100);
        assert_eq!(block_score(&analyzer, &t[0], &t[4]), 0);
    }

    #[test]
    fn test_align_prefers_similar_lengths() {
        let config = BlockDiffConfig::enabled();
        let analyzer = BlockAnalyzer::new(&config);
        let old = doc(
            &config,
            "<h2>Objective</h2><ul><li>x</li></ul><p>Ensure adequate hydulation.</p>",
        );
        let new = doc(
            &config,
            "<h2>Objective</h2><p>A much longer paragraph of clinical text.</p><p>Ensure adequate hydration.</p>",
        );
        let o = texts(&analyzer, &old);
        let n = texts(&analyzer, &new);

        assert_eq!(align_blocks(&analyzer, &o, &n), vec![(0, 0), (2, 2)]);
    }

    #[test]
    fn test_align_tie_prefers_identical_content() {
        let config = BlockDiffConfig::enabled();
        let analyzer = BlockAnalyzer::new(&config);
        let old = doc(&config, "<p>A</p><p>C</p>");
        let new = doc(&config, "<p>A</p><p>B</p><p>C</p>");
        let o = texts(&analyzer, &old);
        let n = texts(&analyzer, &new);

        assert_eq!(align_blocks(&analyzer, &o, &n), vec![(0, 0), (1, 2)]);
    }

    #[test]
    fn test_type_change_detected() {
        let config = BlockDiffConfig::enabled();
        let (old, new, found) = changes(
            &config,
            "<h2>T</h2><ul><li>a</li></ul><p>z</p>",
            "<h2>T</h2><p>a</p><p>z</p>",
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].old_blocks, 1..2);
        assert_eq!(found[0].new_blocks, 1..2);
        assert_eq!(text(&old.tokens, found[0].old_tokens.clone()), "<ul><li>a</li></ul>");
        assert_eq!(text(&new.tokens, found[0].new_tokens.clone()), "<p>a</p>");
    }

    #[test]
    fn test_same_structure_has_no_changes() {
        let config = BlockDiffConfig::enabled();
        let (_, _, found) = changes(&config, "<p>one</p><p>two</p>", "<p>uno</p><p>dos y tres</p>");
        assert!(found.is_empty());
    }

    #[test]
    fn test_equivalent_types_are_stable() {
        let config = BlockDiffConfig::enabled().with_equivalent_types(["ul", "ol"]);
        let (_, _, found) = changes(&config, "<ul><li>a</li></ul>", "<ol><li>a</li></ol>");
        assert!(found.is_empty());
    }

    #[test]
    fn test_inserted_block_between_anchors() {
        let config = BlockDiffConfig::enabled();
        let (old, new, found) = changes(
            &config,
            "<p>A</p>\n<p>C</p>",
            "<p>A</p>\n<p>B</p>\n<p>C</p>",
        );
        assert_eq!(found.len(), 1);
        let change = &found[0];
        assert!(change.old_blocks.is_empty());
        assert!(change.old_tokens.is_empty());
        assert_eq!(text(&old.tokens, 0..change.old_tokens.start), "<p>A</p>\n");
        assert_eq!(text(&new.tokens, change.new_tokens.clone()), "<p>B</p>\n");
    }

    #[test]
    fn test_inserted_block_after_changed_text() {
        let config = BlockDiffConfig::enabled();
        let (old, new, found) = changes(
            &config,
            "<p>A</p>foo<p>C</p>",
            "<p>A</p>bar<p>B</p><p>C</p>",
        );
        assert_eq!(found.len(), 1);
        let change = &found[0];
        assert!(change.old_tokens.is_empty());
        assert_eq!(text(&old.tokens, 0..change.old_tokens.start), "<p>A</p>foo");
        assert_eq!(text(&new.tokens, 0..change.new_tokens.start), "<p>A</p>bar");
        assert_eq!(text(&new.tokens, change.new_tokens.clone()), "<p>B</p>");
    }

    #[test]
    fn test_deleted_trailing_block() {
        let config = BlockDiffConfig::enabled();
        let (old, new, found) = changes(&config, "<p>A</p><ul><li>x</li></ul>tail", "<p>A</p>tail");
        assert_eq!(found.len(), 1);
        let change = &found[0];
        assert_eq!(text(&old.tokens, change.old_tokens.clone()), "<ul><li>x</li></ul>");
        assert!(change.new_tokens.is_empty());
        assert_eq!(text(&new.tokens, change.new_tokens.end..new.tokens.len()), "tail");
    }

    #[test]
    fn test_no_blocks_no_changes() {
        let config = BlockDiffConfig::enabled();
        let (_, _, found) = changes(&config, "plain text", "other text");
        assert!(found.is_empty());
    }
}
