//! Quoted phrase recognition.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    ast::{Negation, Node, Span},
    escape::Escaper,
};

/// A complete phrase with its optional modifiers.
static PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?s)(?P<negate>[-!])?"(?P<value>(?:\\.|[^"\\])*)"(?P<slop>~\d+)?(?P<stem>~)?"#)
        .expect("phrase pattern is valid")
});

/// Phrase text ending with an unescaped `*`.
static PREFIX_PHRASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?s)(?:\\.|[^\\])+\*$").expect("prefix pattern is valid"));

/// An opening quote, possibly negated.
static PHRASE_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^(?P<negate>[-!])?""#).expect("phrase start pattern is valid"));

/// Recognizes `"..."` phrases.
#[derive(Debug, Clone, Copy)]
pub struct PhraseParser<'a> {
    /// Unescapes phrase text.
    escaper: &'a dyn Escaper,
}

impl<'a> PhraseParser<'a> {
    /// Creates a phrase parser.
    pub const fn new(escaper: &'a dyn Escaper) -> Self {
        Self { escaper }
    }

    /// Parses a phrase starting exactly at `start`, ending no later than
    /// `max_offset`.
    pub fn parse(&self, query: &str, start: usize, max_offset: usize) -> Option<Node> {
        let caps = PHRASE.captures(&query[start..])?;
        let end = start + caps.get(0)?.end();
        if end > max_offset {
            return None;
        }

        let negation = caps
            .name("negate")
            .and_then(|m| m.as_str().chars().next())
            .and_then(Negation::from_char);
        let phrase_start = start + usize::from(negation.is_some());
        let span = Span::new(phrase_start, end);
        let raw = caps.name("value").map_or("", |m| m.as_str());
        let slop = caps
            .name("slop")
            .map(|m| m.as_str()[1..].parse::<u32>().unwrap_or(u32::MAX));
        let use_stem = caps.name("stem").is_some();

        let node = if slop.is_none() && !use_stem && PREFIX_PHRASE.is_match(raw) {
            Node::PhrasePrefix {
                span,
                text: self.escaper.unescape(&raw[..raw.len() - 1]),
            }
        } else {
            Node::Phrase {
                span,
                text: self.escaper.unescape(raw),
                slop,
                use_stem,
            }
        };

        Some(match negation {
            Some(negation) => Node::negated(Span::new(start, end), node, negation),
            None => node,
        })
    }

    /// Builds the recovery node for a `"` that is never closed before
    /// `max_offset`.
    pub fn parse_unbalanced(&self, query: &str, start: usize, max_offset: usize) -> Option<Node> {
        let caps = PHRASE_START.captures(&query[start..])?;
        let negation = caps
            .name("negate")
            .and_then(|m| m.as_str().chars().next())
            .and_then(Negation::from_char);
        let phrase_start = start + usize::from(negation.is_some());
        let text_start = (phrase_start + 1).min(max_offset);
        let node = Node::UnbalancedPhrase {
            span: Span::new(phrase_start, max_offset),
            text: query[text_start..max_offset].to_string(),
        };

        Some(match negation {
            Some(negation) => Node::negated(Span::new(start, max_offset), node, negation),
            None => node,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escape::DefaultEscaper;

    fn parse(query: &str) -> Option<Node> {
        let escaper = DefaultEscaper::default();
        PhraseParser::new(&escaper).parse(query, 0, query.len())
    }

    #[test]
    fn plain_phrase() {
        assert_eq!(
            parse(r#""red car""#),
            Some(Node::Phrase {
                span: Span::new(0, 9),
                text: "red car".into(),
                slop: None,
                use_stem: false,
            })
        );
    }

    #[test]
    fn slop_and_stem() {
        assert_eq!(
            parse(r#""red car"~2~ rest"#),
            Some(Node::Phrase {
                span: Span::new(0, 12),
                text: "red car".into(),
                slop: Some(2),
                use_stem: true,
            })
        );
        assert_eq!(
            parse(r#""red car"~"#),
            Some(Node::Phrase {
                span: Span::new(0, 10),
                text: "red car".into(),
                slop: None,
                use_stem: true,
            })
        );
    }

    #[test]
    fn prefix_phrase() {
        assert_eq!(
            parse(r#""red car*""#),
            Some(Node::PhrasePrefix {
                span: Span::new(0, 10),
                text: "red car".into(),
            })
        );
    }

    #[test]
    fn slop_disables_prefix() {
        let node = parse(r#""red car*"~1"#).unwrap();
        assert!(matches!(node, Node::Phrase { slop: Some(1), .. }));
    }

    #[test]
    fn escaped_star_is_not_prefix() {
        let node = parse(r#""red car\*""#).unwrap();
        assert_eq!(
            node,
            Node::Phrase {
                span: Span::new(0, 11),
                text: "red car*".into(),
                slop: None,
                use_stem: false,
            }
        );
    }

    #[test]
    fn escaped_quote_inside() {
        let node = parse(r#""say \"hi\"" x"#).unwrap();
        assert_eq!(node.span(), Span::new(0, 12));
        assert!(matches!(node, Node::Phrase { ref text, .. } if text == r#"say "hi""#));
    }

    #[test]
    fn negated_phrase() {
        let node = parse(r#"-"red car""#).unwrap();
        let Node::Negated {
            span,
            inner,
            negation,
        } = node
        else {
            panic!("expected negated node");
        };
        assert_eq!(span, Span::new(0, 10));
        assert_eq!(negation, Negation::Dash);
        assert_eq!(inner.span(), Span::new(1, 10));
    }

    #[test]
    fn bounded_by_max_offset() {
        let escaper = DefaultEscaper::default();
        let parser = PhraseParser::new(&escaper);
        assert!(parser.parse(r#""a b" c"#, 0, 4).is_none());
        assert!(parser.parse(r#""a b" c"#, 0, 5).is_some());
    }

    #[test]
    fn unterminated_is_none() {
        assert!(parse(r#""red car"#).is_none());
        assert!(parse("red").is_none());
    }

    #[test]
    fn backslash_escapes_closing_quote() {
        assert!(parse(r#""foo\" bar"#).is_none());
        assert!(parse(r#""foo\\" bar"#).is_some());
    }

    #[test]
    fn unbalanced_recovery() {
        let escaper = DefaultEscaper::default();
        let parser = PhraseParser::new(&escaper);
        assert_eq!(
            parser.parse_unbalanced(r#"!"open text"#, 0, 11),
            Some(Node::negated(
                Span::new(0, 11),
                Node::UnbalancedPhrase {
                    span: Span::new(1, 11),
                    text: "open text".into(),
                },
                Negation::Bang,
            ))
        );
    }
}
