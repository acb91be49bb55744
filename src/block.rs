//! Block-level element analysis
//!
//! Finds the spans of top-level block elements (paragraphs, lists, headings,
//! table parts, ...) in a token sequence. Only depth-0 blocks are reported;
//! nested blocks are part of their ancestor's span.

use compact_str::CompactString;
use rustc_hash::FxHashSet;

use crate::token::{join, Token};

/// Block-level tags used when no override is configured.
pub const DEFAULT_BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "ul", "ol", "li", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "table",
    "thead", "tbody", "tfoot", "tr", "td", "th", "caption", "section", "article", "header",
    "footer", "nav", "aside", "main", "dl", "dt", "dd",
];

// =============================================================================
// BlockDiffConfig
// =============================================================================

/// Configuration of the block-aware diff layer.
///
/// Tag names are matched case-insensitively.
#[derive(Debug, Clone)]
pub struct BlockDiffConfig {
    /// Whether block-aware diffing runs at all.
    /// Default: false
    pub enabled: bool,
    block_elements: FxHashSet<CompactString>,
    equivalent_types: Vec<Vec<CompactString>>,
}

impl Default for BlockDiffConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            block_elements: DEFAULT_BLOCK_ELEMENTS
                .iter()
                .map(|t| CompactString::from(*t))
                .collect(),
            equivalent_types: Vec::new(),
        }
    }
}

impl BlockDiffConfig {
    /// Default block set, enabled.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Replace the set of block-level tag names.
    pub fn with_block_elements<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.block_elements = tags.into_iter().map(|t| lowercase(t.as_ref())).collect();
        self
    }

    /// Declare a group of tag names interchangeable for type comparison.
    pub fn with_equivalent_types<I, S>(mut self, group: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.equivalent_types
            .push(group.into_iter().map(|t| lowercase(t.as_ref())).collect());
        self
    }

    /// Whether `tag` (any case) is block-level.
    pub fn is_block_element(&self, tag: &str) -> bool {
        self.block_elements.contains(lowercase(tag).as_str())
    }

    pub fn equivalent_types(&self) -> &[Vec<CompactString>] {
        &self.equivalent_types
    }
}

fn lowercase(tag: &str) -> CompactString {
    let mut out = CompactString::from(tag);
    out.make_ascii_lowercase();
    out
}

// =============================================================================
// Block
// =============================================================================

/// Span of a top-level block element over a token array.
///
/// `start` is the index of the opening tag and `end` the index of the matching
/// closing tag (inclusive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Lowercase tag name
    pub tag_name: CompactString,
    pub start: usize,
    pub end: usize,
    pub depth: usize,
}

impl Block {
    /// Token range covered by the block, boundary tags included.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end + 1
    }

    /// Token range between the boundary tags.
    pub fn inner_range(&self) -> std::ops::Range<usize> {
        self.start + 1..self.end
    }
}

/// Open block on the analyzer stack.
struct OpenBlock {
    tag_name: CompactString,
    start: usize,
    depth: usize,
}

// =============================================================================
// BlockAnalyzer
// =============================================================================

/// Extracts top-level blocks and compares their types.
#[derive(Debug, Clone, Copy)]
pub struct BlockAnalyzer<'c> {
    config: &'c BlockDiffConfig,
}

impl<'c> BlockAnalyzer<'c> {
    pub fn new(config: &'c BlockDiffConfig) -> Self {
        Self { config }
    }

    /// Collect depth-0 blocks, sorted by start index.
    ///
    /// A closing tag pairs with the nearest open tag of the same name and
    /// removes only that entry; tags left open keep counting towards depth.
    /// Closing tags with no open counterpart and unclosed opening tags produce
    /// no block.
    pub fn analyze(&self, tokens: &[Token]) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut stack: Vec<OpenBlock> = Vec::new();
        let mut depth = 0;

        for (index, token) in tokens.iter().enumerate() {
            let Some(name) = token.tag_name() else {
                continue;
            };
            if !self.config.is_block_element(name) || token.is_self_closing_tag() {
                continue;
            }
            let name = lowercase(name);

            if !token.is_closing_tag() {
                stack.push(OpenBlock {
                    tag_name: name,
                    start: index,
                    depth,
                });
                depth += 1;
                continue;
            }

            let Some(pos) = stack.iter().rposition(|open| open.tag_name == name) else {
                continue;
            };
            let open = stack.remove(pos);
            depth -= 1;

            if open.depth == 0 {
                blocks.push(Block {
                    tag_name: open.tag_name,
                    start: open.start,
                    end: index,
                    depth: 0,
                });
            }
        }

        blocks.sort_by_key(|b| b.start);
        blocks
    }

    /// Whether two blocks have the same (or equivalent) type.
    ///
    /// A missing block never matches.
    pub fn is_same_block_type(&self, a: Option<&Block>, b: Option<&Block>) -> bool {
        let (Some(a), Some(b)) = (a, b) else {
            return false;
        };
        if a.tag_name == b.tag_name {
            return true;
        }
        self.config
            .equivalent_types
            .iter()
            .any(|group| group.contains(&a.tag_name) && group.contains(&b.tag_name))
    }

    /// Source text of the whole block, boundary tags included.
    pub fn content(&self, tokens: &[Token], block: &Block) -> String {
        join(&tokens[block.range()])
    }

    /// Source text between the boundary tags.
    pub fn inner_content(&self, tokens: &[Token], block: &Block) -> String {
        join(&tokens[block.inner_range()])
    }
}

// =============================================================================
// Tests
// =============================================================================
