//! Tokenizer splitting markup into literal spans and placeholder tokens
//!
//! Token grammar: `{{ name }}` where `name` matches `[A-Za-z_][A-Za-z0-9_.-]*`,
//! with optional spaces or tabs inside the braces. Everything else, including a
//! lone or unterminated `{{`, is literal text.

use logos::{Lexer, Logos, SpannedIter};

use crate::error::Span;

#[derive(Logos, Debug, Clone, PartialEq)]
enum RawToken<'a> {
    #[regex(r"\{+", open_braces)]
    Braces(Opening<'a>),

    #[regex(r"[^{]+")]
    Text,
}

/// A run of opening braces, and the placeholder it opens if any
#[derive(Debug, Clone, PartialEq)]
struct Opening<'a> {
    braces: usize,
    name: Option<&'a str>,
}

/// Consume `name }}` after a brace run of two or more
fn open_braces<'a>(lex: &mut Lexer<'a, RawToken<'a>>) -> Opening<'a> {
    let braces = lex.slice().len();
    if braces < 2 {
        return Opening { braces, name: None };
    }
    match placeholder_tail(lex.remainder()) {
        Some((name, consumed)) => {
            lex.bump(consumed);
            Opening {
                braces,
                name: Some(name),
            }
        }
        None => Opening { braces, name: None },
    }
}

/// Match `[ \t]* name [ \t]* }}` at the start of `rest`
fn placeholder_tail(rest: &str) -> Option<(&str, usize)> {
    let bytes = rest.as_bytes();
    let blank = |b: u8| b == b' ' || b == b'\t';

    let mut i = 0;
    while i < bytes.len() && blank(bytes[i]) {
        i += 1;
    }
    let start = i;
    if i < bytes.len() && (bytes[i].is_ascii_alphabetic() || bytes[i] == b'_') {
        i += 1;
    } else {
        return None;
    }
    while i < bytes.len()
        && (bytes[i].is_ascii_alphanumeric() || matches!(bytes[i], b'_' | b'.' | b'-'))
    {
        i += 1;
    }
    let end = i;
    while i < bytes.len() && blank(bytes[i]) {
        i += 1;
    }

    if rest[i..].starts_with("}}") {
        Some((&rest[start..end], i + 2))
    } else {
        None
    }
}

/// One piece of markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Markup copied to the output unchanged
    Literal { text: &'a str, span: Span },
    /// A placeholder token; `span` covers the braces
    Placeholder { name: &'a str, span: Span },
}

impl Segment<'_> {
    pub fn span(&self) -> &Span {
        match self {
            Segment::Literal { span, .. } | Segment::Placeholder { span, .. } => span,
        }
    }
}

/// Lazy iterator over the segments of a markup string
///
/// Adjacent literal pieces are merged, so two literals never follow each other.
pub struct Segments<'a> {
    source: &'a str,
    lexer: SpannedIter<'a, RawToken<'a>>,
    pending: Option<(&'a str, Span)>,
}

fn literal_segment(source: &str, span: Span) -> Segment<'_> {
    Segment::Literal {
        text: &source[span.clone()],
        span,
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some((name, span)) = self.pending.take() {
            return Some(Segment::Placeholder { name, span });
        }

        let source = self.source;
        let mut literal: Option<Span> = None;
        let extend = |literal: Option<Span>, span: Span| match literal {
            Some(lit) => lit.start..span.end,
            None => span,
        };

        for (token, span) in self.lexer.by_ref() {
            match token {
                Ok(RawToken::Braces(Opening {
                    braces,
                    name: Some(name),
                })) => {
                    // Extra leading braces stay literal
                    let open = span.start + braces - 2;
                    if open > span.start {
                        literal = Some(extend(literal, span.start..open));
                    }
                    let placeholder = open..span.end;
                    match literal {
                        Some(lit) => {
                            self.pending = Some((name, placeholder));
                            return Some(literal_segment(source, lit));
                        }
                        None => return Some(Segment::Placeholder { name, span: placeholder }),
                    }
                }
                _ => literal = Some(extend(literal, span)),
            }
        }

        literal.map(|lit| literal_segment(source, lit))
    }
}

/// Split markup into segments
pub fn segments(markup: &str) -> Segments<'_> {
    Segments {
        source: markup,
        lexer: RawToken::lexer(markup).spanned(),
        pending: None,
    }
}

/// Whether `name` can be written as a placeholder token
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn collect(markup: &str) -> Vec<Segment<'_>> {
        segments(markup).collect()
    }

    #[test]
    fn test_literal_and_placeholder() {
        assert_eq!(
            collect("Hello {{nickname}}!"),
            vec![
                Segment::Literal {
                    text: "Hello ",
                    span: 0..6
                },
                Segment::Placeholder {
                    name: "nickname",
                    span: 6..18
                },
                Segment::Literal {
                    text: "!",
                    span: 18..19
                },
            ]
        );
    }

    #[test]
    fn test_inner_whitespace_is_trimmed() {
        let names: Vec<_> = segments("{{ a }}{{\tb.c\t}}")
            .filter_map(|s| match s {
                Segment::Placeholder { name, .. } => Some(name),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["a", "b.c"]);
    }

    #[test]
    fn test_stray_braces_are_literal() {
        let markup = "a { b {{ c {{1x}} {{ok";
        assert_eq!(
            collect(markup),
            vec![Segment::Literal {
                text: markup,
                span: 0..markup.len()
            }]
        );
    }

    #[test]
    fn test_css_braces_survive() {
        let markup = "<style>.t { fill: red; }</style>{{x}}";
        let segs = collect(markup);
        assert_eq!(segs.len(), 2);
        assert_eq!(
            segs[0],
            Segment::Literal {
                text: "<style>.t { fill: red; }</style>",
                span: 0..32
            }
        );
    }

    #[test]
    fn test_repeated_and_adjacent_tokens() {
        let segs = collect("{{a}}{{a}}");
        assert_eq!(
            segs,
            vec![
                Segment::Placeholder {
                    name: "a",
                    span: 0..5
                },
                Segment::Placeholder {
                    name: "a",
                    span: 5..10
                },
            ]
        );
    }

    #[test]
    fn test_triple_brace() {
        let segs = collect("{{{a}}}");
        assert_eq!(
            segs,
            vec![
                Segment::Literal {
                    text: "{",
                    span: 0..1
                },
                Segment::Placeholder {
                    name: "a",
                    span: 1..6
                },
                Segment::Literal {
                    text: "}",
                    span: 6..7
                },
            ]
        );
    }

    #[test]
    fn test_non_ascii_text() {
        let segs = collect("你好 {{nickname}}");
        assert_eq!(segs[1].span(), &(7..19));
    }

    #[test]
    fn test_empty_markup() {
        assert!(collect("").is_empty());
    }

    #[test]
    fn test_is_valid_name() {
        assert!(is_valid_name("nickname"));
        assert!(is_valid_name("_post.likes-1"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("1st"));
        assert!(!is_valid_name("has space"));
    }
}
