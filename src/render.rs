//! HTML rendering of an edit script
//!
//! Renders tokens back to HTML, wrapping changed text in `<ins>`/`<del>`
//! markers. Within a changed span, runs of text tokens are wrapped together
//! while runs of tags are emitted bare, so wrapping never splits an element.

use crate::algo::{Action, Operation};
use crate::token::{push_text, Token};

// =============================================================================
// Markers
// =============================================================================

/// Marker element wrapped around changed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Ins,
    Del,
}

impl Marker {
    pub const fn tag(self) -> &'static str {
        match self {
            Marker::Ins => "ins",
            Marker::Del => "del",
        }
    }
}

/// CSS class of a marker element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffClass {
    /// Pure insertion (`diffins`)
    Insert,
    /// Pure deletion (`diffdel`)
    Delete,
    /// Either side of a replacement (`diffmod`)
    Modify,
}

impl DiffClass {
    pub const fn css(self) -> &'static str {
        match self {
            DiffClass::Insert => "diffins",
            DiffClass::Delete => "diffdel",
            DiffClass::Modify => "diffmod",
        }
    }
}

// =============================================================================
// RenderStats
// =============================================================================

/// Token counts by how they were rendered.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct RenderStats {
    /// Tokens emitted unchanged
    pub equal: usize,
    /// New tokens marked as inserted (including block insertions)
    pub inserted: usize,
    /// Old tokens marked as deleted (including block deletions)
    pub deleted: usize,
    /// Old and new tokens marked as modified
    pub modified: usize,
    /// Spans replaced as whole blocks
    pub block_replacements: usize,
}

impl RenderStats {
    /// Check if anything was marked as changed
    pub fn has_changes(&self) -> bool {
        self.inserted + self.deleted + self.modified > 0
    }
}

// =============================================================================
// Renderer
// =============================================================================

/// Accumulates rendered HTML.
#[derive(Debug, Default)]
pub struct Renderer {
    output: String,
    stats: RenderStats,
}

impl Renderer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            output: String::with_capacity(capacity),
            stats: RenderStats::default(),
        }
    }

    /// Emit tokens unchanged.
    pub fn equal(&mut self, tokens: &[Token]) {
        self.stats.equal += tokens.len();
        push_text(tokens, &mut self.output);
    }

    /// Emit tokens with text runs wrapped in `marker`, tags bare.
    pub fn wrap(&mut self, marker: Marker, class: DiffClass, tokens: &[Token]) {
        self.count(marker, class, tokens.len());
        wrap_tokens(marker, class, tokens, &mut self.output);
    }

    /// Emit a whole span, tags included, inside one `marker` element.
    ///
    /// Empty spans emit nothing.
    pub fn wrap_block(&mut self, marker: Marker, class: DiffClass, tokens: &[Token]) {
        if tokens.is_empty() {
            return;
        }
        self.count(marker, class, tokens.len());
        open(marker, class, &mut self.output);
        push_text(tokens, &mut self.output);
        close(marker, &mut self.output);
    }

    /// Render one operation of the edit script.
    ///
    /// With `whole_blocks`, a replacement is marked as deletion plus insertion
    /// instead of modification.
    pub fn operation(&mut self, op: &Operation, old: &[Token], new: &[Token], whole_blocks: bool) {
        let old = &old[op.old_range()];
        let new = &new[op.new_range()];
        match op.action {
            Action::Equal => self.equal(new),
            Action::Insert => self.wrap(Marker::Ins, DiffClass::Insert, new),
            Action::Delete => self.wrap(Marker::Del, DiffClass::Delete, old),
            Action::Replace if whole_blocks => {
                self.stats.block_replacements += 1;
                self.wrap(Marker::Del, DiffClass::Delete, old);
                self.wrap(Marker::Ins, DiffClass::Insert, new);
            }
            Action::Replace => {
                self.wrap(Marker::Del, DiffClass::Modify, old);
                self.wrap(Marker::Ins, DiffClass::Modify, new);
            }
            Action::None => {}
        }
    }

    pub fn note_block_replacement(&mut self) {
        self.stats.block_replacements += 1;
    }

    pub fn finish(self) -> (String, RenderStats) {
        (self.output, self.stats)
    }

    fn count(&mut self, marker: Marker, class: DiffClass, n: usize) {
        match (class, marker) {
            (DiffClass::Modify, _) => self.stats.modified += n,
            (_, Marker::Ins) => self.stats.inserted += n,
            (_, Marker::Del) => self.stats.deleted += n,
        }
    }
}

/// Wrap maximal runs of non-tag tokens; emit runs of tags unwrapped.
pub fn wrap_tokens(marker: Marker, class: DiffClass, tokens: &[Token], output: &mut String) {
    let mut rest = tokens;
    while !rest.is_empty() {
        let text_len = rest.iter().take_while(|t| !t.is_tag()).count();
        if text_len > 0 {
            open(marker, class, output);
            push_text(&rest[..text_len], output);
            close(marker, output);
            rest = &rest[text_len..];
        }

        let tag_len = rest.iter().take_while(|t| t.is_tag()).count();
        push_text(&rest[..tag_len], output);
        rest = &rest[tag_len..];
    }
}

fn open(marker: Marker, class: DiffClass, output: &mut String) {
    output.push('<');
    output.push_str(marker.tag());
    output.push_str(" class=\"");
    output.push_str(class.css());
    output.push_str("\">");
}

fn close(marker: Marker, output: &mut String) {
    output.push_str("</");
    output.push_str(marker.tag());
    output.push('>');
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn wrapped(marker: Marker, class: DiffClass, html: &str) -> String {
        let mut out = String::new();
        wrap_tokens(marker, class, &tokenize(html, &[]), &mut out);
        out
    }

    #[test]
    fn test_text_only() {
        assert_eq!(
            wrapped(Marker::Ins, DiffClass::Insert, "new words"),
            "<ins class=\"diffins\">new words</ins>"
        );
    }

    #[test]
    fn test_tags_stay_outside_markers() {
        assert_eq!(
            wrapped(Marker::Del, DiffClass::Delete, "a</p><p class=\"x\">b"),
            "<del class=\"diffdel\">a</del></p><p class=\"x\"><del class=\"diffdel\">b</del>"
        );
    }

    #[test]
    fn test_tags_only() {
        assert_eq!(wrapped(Marker::Ins, DiffClass::Modify, "<br/>"), "<br/>");
        assert_eq!(wrapped(Marker::Ins, DiffClass::Modify, ""), "");
    }

    #[test]
    fn test_wrap_block_includes_tags() {
        let tokens = tokenize("<ul><li>x</li></ul>", &[]);
        let mut renderer = Renderer::default();
        renderer.wrap_block(Marker::Del, DiffClass::Delete, &tokens);
        renderer.wrap_block(Marker::Ins, DiffClass::Insert, &[]);
        let (html, stats) = renderer.finish();

        assert_eq!(html, "<del class=\"diffdel\"><ul><li>x</li></ul></del>");
        assert_eq!(stats.deleted, 5);
        assert_eq!(stats.inserted, 0);
    }

    #[test]
    fn test_replace_operation() {
        let old = tokenize("a cat", &[]);
        let new = tokenize("a dog", &[]);
        let mut renderer = Renderer::default();
        renderer.operation(&Operation::new(Action::Equal, 0, 2, 0, 2), &old, &new, false);
        renderer.operation(&Operation::new(Action::Replace, 2, 3, 2, 3), &old, &new, false);
        let (html, stats) = renderer.finish();

        assert_eq!(
            html,
            "a <del class=\"diffmod\">cat</del><ins class=\"diffmod\">dog</ins>"
        );
        assert_eq!(stats.equal, 2);
        assert_eq!(stats.modified, 2);
        assert!(stats.has_changes());
    }

    #[test]
    fn test_replace_as_whole_blocks() {
        let old = tokenize("cat", &[]);
        let new = tokenize("dog", &[]);
        let mut renderer = Renderer::default();
        renderer.operation(&Operation::new(Action::Replace, 0, 1, 0, 1), &old, &new, true);
        let (html, stats) = renderer.finish();

        assert_eq!(
            html,
            "<del class=\"diffdel\">cat</del><ins class=\"diffins\">dog</ins>"
        );
        assert_eq!(stats.block_replacements, 1);
    }

    #[test]
    fn test_equal_uses_new_side() {
        let old = tokenize("<p class=\"old\">x</p>", &[]);
        let new = tokenize("<p class=\"new\">x</p>", &[]);
        let mut renderer = Renderer::default();
        renderer.operation(&Operation::new(Action::Equal, 0, 3, 0, 3), &old, &new, false);
        assert_eq!(renderer.finish().0, "<p class=\"new\">x</p>");
    }
}
