//! HTML-aware word tokenizer
//!
//! Splits markup into [`Token`]s: tags, words, numbers, whitespace runs and
//! entities. The tokenizer never fails. Unterminated tags and entities fall
//! back to literal punctuation, so malformed input still diffs as text.
//!
//! Tags are compared with their attributes stripped (`<p class="x">` compares
//! as `<p>`), except inline emphasis tags, comments and declarations which
//! compare by their exact text.

use compact_str::CompactString;

use crate::expr::{atomic_spans, BlockExpression};
use crate::token::{tag_name, Token, TokenKind};

/// Emphasis tags compared literally (opening and closing forms).
const LITERAL_TAGS: &[&str] = &[
    "b", "i", "u", "s", "em", "strong", "strike", "big", "small", "sub", "sup",
];

const NBSP: &str = "&nbsp;";

/// Tokenize `html`, treating matches of `expressions` as atomic tokens.
pub fn tokenize(html: &str, expressions: &[BlockExpression]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    for span in atomic_spans(html, expressions) {
        scan(&html[pos..span.start], &mut tokens);
        let text = &html[span.start..span.end];
        tokens.push(match span.compare {
            Some(key) => Token::with_compare(TokenKind::Word, text, key),
            None => Token::new(TokenKind::Word, text),
        });
        pos = span.end;
    }
    scan(&html[pos..], &mut tokens);

    trace!(len = html.len(), tokens = tokens.len(), "tokenized");
    tokens
}

/// Scan a segment without atomic spans.
fn scan(src: &str, tokens: &mut Vec<Token>) {
    let mut pos = 0;
    while pos < src.len() {
        let rest = &src[pos..];
        let Some(c) = rest.chars().next() else { break };

        let (kind, len) = match c {
            '<' => match tag_len(rest) {
                Some(len) => (TokenKind::Tag, len),
                None => (TokenKind::Word, 1),
            },
            '&' if rest.starts_with(NBSP) => (TokenKind::Whitespace, whitespace_len(rest)),
            '&' => match entity_len(rest) {
                Some(len) => (TokenKind::Entity, len),
                None => (TokenKind::Word, 1),
            },
            c if c.is_whitespace() => (TokenKind::Whitespace, whitespace_len(rest)),
            c if is_word_char(c) => {
                let len = word_len(rest);
                let kind = if rest[..len].bytes().all(|b| b.is_ascii_digit()) {
                    TokenKind::Number
                } else {
                    TokenKind::Word
                };
                (kind, len)
            }
            c => (TokenKind::Word, c.len_utf8()),
        };

        let text = &rest[..len];
        tokens.push(match kind {
            TokenKind::Tag => tag_token(text),
            kind => Token::new(kind, text),
        });
        pos += len;
    }
}

/// Build a tag token with its comparison form.
fn tag_token(text: &str) -> Token {
    match compare_form(text) {
        Some(key) => Token::with_compare(TokenKind::Tag, text, key),
        None => Token::new(TokenKind::Tag, text),
    }
}

/// Attribute-free comparison form of a tag, or `None` to compare literally.
fn compare_form(tag: &str) -> Option<CompactString> {
    let name = tag_name(tag)?;
    if LITERAL_TAGS.iter().any(|t| t.eq_ignore_ascii_case(name)) {
        return None;
    }

    let mut key = CompactString::with_capacity(name.len() + 4);
    key.push('<');
    if tag.starts_with("</") {
        key.push('/');
    }
    key.push_str(name);
    key.push_str(if tag.ends_with("/>") { "/>" } else { ">" });
    Some(key)
}

/// Length of a tag starting at `<`, if it is terminated before the next `<`.
fn tag_len(rest: &str) -> Option<usize> {
    for (i, b) in rest.bytes().enumerate().skip(1) {
        match b {
            b'>' if i > 1 => return Some(i + 1),
            b'>' | b'<' => return None,
            _ => {}
        }
    }
    None
}

/// Length of an entity starting at `&`, if it is terminated by `;`.
fn entity_len(rest: &str) -> Option<usize> {
    let body = rest
        .bytes()
        .skip(1)
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'#')
        .count();
    (body > 0 && rest.as_bytes().get(body + 1) == Some(&b';')).then_some(body + 2)
}

/// Length of a whitespace run, `&nbsp;` included.
fn whitespace_len(rest: &str) -> usize {
    let mut len = 0;
    loop {
        let tail = &rest[len..];
        if tail.starts_with(NBSP) {
            len += NBSP.len();
            continue;
        }
        match tail.chars().next() {
            Some(c) if c.is_whitespace() => len += c.len_utf8(),
            _ => return len,
        }
    }
}

fn word_len(rest: &str) -> usize {
    rest.char_indices()
        .find(|(_, c)| !is_word_char(*c))
        .map_or(rest.len(), |(i, _)| i)
}

#[inline]
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '#' | '@')
}

// =============================================================================
// Tests
// =============================================================================
