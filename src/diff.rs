//! HTML Diff Engine
//!
//! Compares two HTML documents at word granularity and renders the new
//! document with changes marked by `<ins>`/`<del>` elements.
//!
//! # Algorithm
//!
//! 1. Return the new document unchanged when both inputs are identical
//! 2. Tokenize both documents (tags, words, numbers, whitespace, entities)
//! 3. With block diff enabled, align top-level blocks and render stretches
//!    whose block structure changed as whole-block deletion plus insertion
//! 4. Partition the remaining tokens into matches, coarse groups first
//! 5. Drop orphan matches, synthesize the edit script, and render it
//!
//! # Complexity
//!
//! - Time: roughly O(n * k * g) for n tokens, k candidates per group and
//!   g granularity trials; block alignment adds O(b_old * b_new)
//! - Space: O(n + m) for tokens and group indexes

use std::borrow::Cow;
use std::ops::Range;

use crate::algo::{
    block_changes, matching_blocks, operations, remove_orphans, validate_partition, Action,
    MatchOptions, Operation,
};
use crate::block::{Block, BlockAnalyzer, BlockDiffConfig};
use crate::error::{DiffError, DiffResult, Side};
use crate::expr::BlockExpression;
use crate::render::{DiffClass, Marker, RenderStats, Renderer};
use crate::token::{same_text, Token};
use crate::tokenizer::tokenize;

/// Default largest token group tried by the matcher.
const DEFAULT_MAX_GRANULARITY: usize = 4;

// =============================================================================
// DiffOptions
// =============================================================================

/// Options for one diff call.
///
/// Immutable once a diff starts; every matching pass receives its own
/// [`MatchOptions`] derived from these.
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Patterns whose matches are diffed as single tokens, earlier first.
    pub block_expressions: Vec<BlockExpression>,
    /// Block-aware layer configuration.
    pub block_diff: BlockDiffConfig,
    /// Groups repeating more than `window * accuracy` times are not used as
    /// match candidates; 0.0 keeps every group.
    /// Default: 1.0
    pub repeating_words_accuracy: f64,
    /// Matches not longer than `threshold` times the larger surrounding gap
    /// (in characters) are dropped.
    /// Default: 0.0
    pub orphan_match_threshold: f64,
    /// Treat all whitespace runs as equal while matching.
    /// Default: false
    pub ignore_whitespace_differences: bool,
    /// Largest token group tried by the matcher.
    /// Default: 4
    pub max_granularity: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            block_expressions: Vec::new(),
            block_diff: BlockDiffConfig::default(),
            repeating_words_accuracy: 1.0,
            orphan_match_threshold: 0.0,
            ignore_whitespace_differences: false,
            max_granularity: DEFAULT_MAX_GRANULARITY,
        }
    }
}

impl DiffOptions {
    /// Default options with the block-aware layer enabled.
    pub fn block_aware() -> Self {
        Self {
            block_diff: BlockDiffConfig::enabled(),
            ..Self::default()
        }
    }

    /// Single-token groups only: slower, finest matches.
    pub fn precise() -> Self {
        Self {
            max_granularity: 1,
            ..Self::default()
        }
    }

    pub fn with_block_expression(mut self, expression: BlockExpression) -> Self {
        self.block_expressions.push(expression);
        self
    }

    pub fn with_block_diff(mut self, config: BlockDiffConfig) -> Self {
        self.block_diff = config;
        self
    }

    pub fn with_repeating_words_accuracy(mut self, accuracy: f64) -> Self {
        self.repeating_words_accuracy = accuracy;
        self
    }

    pub fn with_orphan_match_threshold(mut self, threshold: f64) -> Self {
        self.orphan_match_threshold = threshold;
        self
    }

    pub fn with_ignore_whitespace_differences(mut self, ignore: bool) -> Self {
        self.ignore_whitespace_differences = ignore;
        self
    }

    /// Largest group size; values below 1 are raised to 1.
    pub fn with_max_granularity(mut self, granularity: usize) -> Self {
        self.max_granularity = granularity.max(1);
        self
    }

    /// Matcher options for a search starting at `granularity`.
    pub fn match_options(&self, granularity: usize) -> MatchOptions {
        MatchOptions {
            granularity,
            repeating_words_accuracy: self.repeating_words_accuracy,
            ignore_whitespace_differences: self.ignore_whitespace_differences,
        }
    }
}

// =============================================================================
// Results
// =============================================================================

/// Summary of a rendered diff.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct DiffStats {
    /// Inputs were byte-identical; nothing was tokenized
    pub identical: bool,
    /// Number of old tokens
    pub old_tokens: usize,
    /// Number of new tokens
    pub new_tokens: usize,
    /// Tokens emitted unchanged
    pub equal: usize,
    /// New tokens marked as inserted
    pub inserted: usize,
    /// Old tokens marked as deleted
    pub deleted: usize,
    /// Old and new tokens marked as modified
    pub modified: usize,
    /// Spans rendered as whole-block deletion plus insertion
    pub block_replacements: usize,
}

impl DiffStats {
    fn from_render(old_tokens: usize, new_tokens: usize, render: RenderStats) -> Self {
        Self {
            identical: false,
            old_tokens,
            new_tokens,
            equal: render.equal,
            inserted: render.inserted,
            deleted: render.deleted,
            modified: render.modified,
            block_replacements: render.block_replacements,
        }
    }

    /// Check if any change was marked
    pub fn has_changes(&self) -> bool {
        self.inserted + self.deleted + self.modified > 0
    }
}

/// Tokens of both documents with the edit script between them.
#[derive(Debug, Clone)]
pub struct EditScript {
    pub old: Vec<Token>,
    pub new: Vec<Token>,
    /// Operations partitioning `old` and `new`, in order
    pub operations: Vec<Operation>,
}

// =============================================================================
// HtmlDiff
// =============================================================================

/// Diff of two HTML documents.
///
/// ```ignore
/// let options = DiffOptions::block_aware();
/// let html = HtmlDiff::new(old, new).with_options(&options).build()?;
/// ```
#[derive(Debug, Clone)]
pub struct HtmlDiff<'a> {
    old: &'a str,
    new: &'a str,
    options: Cow<'a, DiffOptions>,
}

impl<'a> HtmlDiff<'a> {
    /// Diff with default options.
    pub fn new(old: &'a str, new: &'a str) -> Self {
        Self {
            old,
            new,
            options: Cow::Owned(DiffOptions::default()),
        }
    }

    pub fn with_options(mut self, options: &'a DiffOptions) -> Self {
        self.options = Cow::Borrowed(options);
        self
    }

    pub fn options(&self) -> &DiffOptions {
        &self.options
    }

    /// Render the diff as HTML.
    pub fn build(&self) -> DiffResult<String> {
        self.build_with_stats().map(|(html, _)| html)
    }

    /// Render the diff as HTML, with token counts.
    pub fn build_with_stats(&self) -> DiffResult<(String, DiffStats)> {
        if self.old == self.new {
            debug!(len = self.new.len(), "identical inputs");
            let stats = DiffStats {
                identical: true,
                ..DiffStats::default()
            };
            return Ok((self.new.to_owned(), stats));
        }

        let old = tokenize(self.old, &self.options.block_expressions);
        let new = tokenize(self.new, &self.options.block_expressions);
        debug!(old = old.len(), new = new.len(), "tokenized");

        let mut engine = Engine {
            options: &self.options,
            renderer: Renderer::with_capacity(self.new.len() + self.new.len() / 4),
        };
        engine.diff_tokens(&old, &new, self.options.block_diff.enabled)?;

        let (html, render) = engine.renderer.finish();
        Ok((html, DiffStats::from_render(old.len(), new.len(), render)))
    }

    /// Word-level edit script over the whole documents.
    ///
    /// The block-aware layer is not applied; callers render the script
    /// themselves.
    pub fn operations(&self) -> DiffResult<EditScript> {
        let old = tokenize(self.old, &self.options.block_expressions);
        let new = tokenize(self.new, &self.options.block_expressions);
        let operations = edit_script(&old, &new, &self.options)?;
        Ok(EditScript {
            old,
            new,
            operations,
        })
    }
}

/// Diff two HTML documents with default options.
pub fn diff(old: &str, new: &str) -> DiffResult<String> {
    HtmlDiff::new(old, new).build()
}

/// Diff two HTML documents.
pub fn diff_with_options(old: &str, new: &str, options: &DiffOptions) -> DiffResult<String> {
    HtmlDiff::new(old, new).with_options(options).build()
}

// =============================================================================
// Engine
// =============================================================================

struct Engine<'o> {
    options: &'o DiffOptions,
    renderer: Renderer,
}

impl Engine<'_> {
    /// Diff and render one pair of token runs.
    ///
    /// Sub-diffs around block changes run with the block layer disabled, so
    /// nesting is at most one level deep.
    fn diff_tokens(&mut self, old: &[Token], new: &[Token], block_aware: bool) -> DiffResult<()> {
        let options = self.options;
        if same_text(old, new) {
            trace!(len = new.len(), "identical token run");
            self.renderer.equal(new);
            return Ok(());
        }

        if !block_aware {
            let ops = edit_script(old, new, options)?;
            for op in &ops {
                self.renderer.operation(op, old, new, false);
            }
            return Ok(());
        }

        let analyzer = BlockAnalyzer::new(&options.block_diff);
        let old_blocks = analyzer.analyze(old);
        let new_blocks = analyzer.analyze(new);
        let changes = block_changes(&analyzer, old, &old_blocks, new, &new_blocks);

        if changes.is_empty() {
            let ops = edit_script(old, new, options)?;
            for op in &ops {
                let whole_blocks = op.action == Action::Replace
                    && needs_block_replacement(&analyzer, op, &old_blocks, &new_blocks);
                self.renderer.operation(op, old, new, whole_blocks);
            }
            return Ok(());
        }

        let mut old_cursor = 0;
        let mut new_cursor = 0;
        for change in &changes {
            let old_before = slice(old, old_cursor..change.old_tokens.start, Side::Old)?;
            let new_before = slice(new, new_cursor..change.new_tokens.start, Side::New)?;
            self.diff_tokens(old_before, new_before, false)?;

            let removed = slice(old, change.old_tokens.clone(), Side::Old)?;
            let added = slice(new, change.new_tokens.clone(), Side::New)?;
            self.renderer.note_block_replacement();
            self.renderer.wrap_block(Marker::Del, DiffClass::Delete, removed);
            self.renderer.wrap_block(Marker::Ins, DiffClass::Insert, added);

            old_cursor = change.old_tokens.end;
            new_cursor = change.new_tokens.end;
        }

        let old_rest = slice(old, old_cursor..old.len(), Side::Old)?;
        let new_rest = slice(new, new_cursor..new.len(), Side::New)?;
        self.diff_tokens(old_rest, new_rest, false)
    }
}

/// Match, filter and validate the edit script for two token runs.
fn edit_script(old: &[Token], new: &[Token], options: &DiffOptions) -> DiffResult<Vec<Operation>> {
    let granularity = options
        .max_granularity
        .min(old.len())
        .min(new.len());
    let matches = matching_blocks(old, new, options.match_options(granularity));
    let retained = remove_orphans(&matches, old, new, options.orphan_match_threshold);
    debug!(
        granularity,
        raw = matches.len(),
        retained = retained.len(),
        "matches selected"
    );

    let ops = operations(&retained);
    validate_partition(&ops, old.len(), new.len())?;
    Ok(ops)
}

/// Whether a replacement crosses block structure and must render whole.
///
/// True when the blocks overlapped by the old and new ranges differ in
/// number or in pairwise type.
fn needs_block_replacement(
    analyzer: &BlockAnalyzer<'_>,
    op: &Operation,
    old_blocks: &[Block],
    new_blocks: &[Block],
) -> bool {
    let old_hit: Vec<&Block> = overlapping(old_blocks, op.old_range()).collect();
    let new_hit: Vec<&Block> = overlapping(new_blocks, op.new_range()).collect();

    old_hit.len() != new_hit.len()
        || old_hit
            .iter()
            .zip(&new_hit)
            .any(|(&a, &b)| !analyzer.is_same_block_type(Some(a), Some(b)))
}

fn overlapping(blocks: &[Block], range: Range<usize>) -> impl Iterator<Item = &Block> {
    blocks
        .iter()
        .filter(move |b| b.start < range.end && range.start <= b.end)
}

fn slice(tokens: &[Token], range: Range<usize>, side: Side) -> DiffResult<&[Token]> {
    let (start, end) = (range.start, range.end);
    tokens.get(range).ok_or(DiffError::BrokenPartition {
        side,
        expected: start,
        found: end,
    })
}

// =============================================================================
// Tests
// =============================================================================
