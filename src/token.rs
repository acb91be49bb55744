//! Token types for the HTML word diff
//!
//! A [`Token`] is the smallest unit the diff compares and renders. Every token
//! keeps its source text verbatim, so concatenating the source text of all
//! tokens reproduces the input byte-for-byte. Tags and atomic tokens may carry
//! a separate comparison key (attributes stripped, or a caller-supplied
//! `compareBy` match) which is what the matcher sees.

use compact_str::CompactString;

// =============================================================================
// TokenKind
// =============================================================================

/// Classification of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `<...>` markup, including comments and doctype
    Tag,
    /// Run of word characters, a single punctuation character, or an atomic
    /// token produced by a block expression
    Word,
    /// Run of ASCII digits not attached to other word characters
    Number,
    /// Run of whitespace, including `&nbsp;`
    Whitespace,
    /// Character reference such as `&amp;` or `&#160;`
    Entity,
}

// =============================================================================
// Token
// =============================================================================

/// A single comparable unit of HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    /// Source text, rendered as-is
    text: CompactString,
    /// Comparison key when it differs from `text`
    compare: Option<CompactString>,
}

impl Token {
    /// Create a token whose comparison key is its source text.
    pub fn new(kind: TokenKind, text: impl Into<CompactString>) -> Self {
        Self {
            kind,
            text: text.into(),
            compare: None,
        }
    }

    /// Create a token compared by `compare` but rendered as `text`.
    ///
    /// The key is dropped when it equals the source text.
    pub fn with_compare(
        kind: TokenKind,
        text: impl Into<CompactString>,
        compare: impl Into<CompactString>,
    ) -> Self {
        let text = text.into();
        let compare = compare.into();
        let compare = (compare != text).then_some(compare);
        Self {
            kind,
            text,
            compare,
        }
    }

    #[inline]
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Source text (the original form, attributes included).
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Comparison key used during matching.
    #[inline]
    pub fn key(&self) -> &str {
        self.compare.as_deref().unwrap_or(&self.text)
    }

    /// Original form, when it differs from the comparison key.
    #[inline]
    pub fn original(&self) -> Option<&str> {
        self.compare.as_ref().map(|_| self.text.as_str())
    }

    #[inline]
    pub fn is_tag(&self) -> bool {
        self.kind == TokenKind::Tag
    }

    #[inline]
    pub fn is_whitespace(&self) -> bool {
        self.kind == TokenKind::Whitespace
    }

    /// Length of the source text in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Tag name for tag tokens (`div` for `<div class="x">` and `</div>`).
    ///
    /// Returns `None` for non-tags and for comments, doctypes and processing
    /// instructions.
    pub fn tag_name(&self) -> Option<&str> {
        if !self.is_tag() {
            return None;
        }
        tag_name(&self.text)
    }

    /// Whether this is a closing tag (`</p>`).
    pub fn is_closing_tag(&self) -> bool {
        self.is_tag() && self.text.starts_with("</")
    }

    /// Whether this is a self-closing tag (`<br/>`).
    pub fn is_self_closing_tag(&self) -> bool {
        self.is_tag() && self.text.ends_with("/>")
    }
}

/// Extract the tag name from tag markup.
pub(crate) fn tag_name(tag: &str) -> Option<&str> {
    let inner = tag.strip_prefix('<')?;
    let inner = inner.strip_prefix('/').unwrap_or(inner);
    let end = inner
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .unwrap_or(inner.len());
    let name = &inner[..end];
    let valid = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic());
    valid.then_some(name)
}

/// Concatenate the source text of `tokens`.
pub fn join(tokens: &[Token]) -> String {
    let mut out = String::with_capacity(tokens.iter().map(|t| t.text.len()).sum());
    push_text(tokens, &mut out);
    out
}

/// Append the source text of `tokens` to `out`.
pub(crate) fn push_text(tokens: &[Token], out: &mut String) {
    for token in tokens {
        out.push_str(&token.text);
    }
}

/// Whether two token runs have identical source text.
pub(crate) fn same_text(a: &[Token], b: &[Token]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.text == y.text)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_defaults_to_text() {
        let token = Token::new(TokenKind::Word, "hello");
        assert_eq!(token.key(), "hello");
        assert_eq!(token.text(), "hello");
        assert_eq!(token.original(), None);
    }

    #[test]
    fn test_compare_key_kept_only_when_different() {
        let tag = Token::with_compare(TokenKind::Tag, "<p class=\"a\">", "<p>");
        assert_eq!(tag.key(), "<p>");
        assert_eq!(tag.original(), Some("<p class=\"a\">"));

        let plain = Token::with_compare(TokenKind::Tag, "<p>", "<p>");
        assert_eq!(plain.original(), None);
    }

    #[test]
    fn test_tag_name() {
        let open = Token::new(TokenKind::Tag, "<div id=\"x\">");
        let close = Token::new(TokenKind::Tag, "</div>");
        let void = Token::new(TokenKind::Tag, "<br/>");
        let comment = Token::new(TokenKind::Tag, "<!-- note -->");

        assert_eq!(open.tag_name(), Some("div"));
        assert_eq!(close.tag_name(), Some("div"));
        assert_eq!(void.tag_name(), Some("br"));
        assert_eq!(comment.tag_name(), None);

        assert!(close.is_closing_tag());
        assert!(!open.is_closing_tag());
        assert!(void.is_self_closing_tag());
    }

    #[test]
    fn test_tag_name_of_word_is_none() {
        assert_eq!(Token::new(TokenKind::Word, "<p>").tag_name(), None);
    }

    #[test]
    fn test_char_len_counts_chars() {
        assert_eq!(Token::new(TokenKind::Word, "héllo").char_len(), 5);
    }

    #[test]
    fn test_join_and_same_text() {
        let a = vec![
            Token::new(TokenKind::Word, "a"),
            Token::new(TokenKind::Whitespace, " "),
            Token::new(TokenKind::Word, "b"),
        ];
        assert_eq!(join(&a), "a b");
        assert!(same_text(&a, &a.clone()));
        assert!(!same_text(&a, &a[..2]));
    }
}
