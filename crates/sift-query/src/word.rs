//! Bare term recognition: words, fuzzy terms, prefixes and wildcards.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    ast::{Negation, Node, Span},
    escape::Escaper,
    text::{char_before, find_word_stop, starts_with_word_char},
};

/// Maximum number of wildcard characters in a single term.
pub const MAX_WILDCARDS: usize = 3;

/// `word~` with an optional edit distance.
static FUZZY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<word>\w+)~(?P<distance>[0-2])?$").expect("fuzzy pattern is valid"));

/// Word characters followed by stars.
static SIMPLE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+\*+$").expect("prefix pattern is valid"));

/// Recognizes a single non-phrase term.
#[derive(Debug, Clone, Copy)]
pub struct WordParser<'a> {
    /// Unescapes plain words and provides the wildcard switch.
    escaper: &'a dyn Escaper,
}

impl<'a> WordParser<'a> {
    /// Creates a word parser.
    pub const fn new(escaper: &'a dyn Escaper) -> Self {
        Self { escaper }
    }

    /// Parses the term starting at `start`.
    ///
    /// Returns `None` when no character can be consumed there.
    pub fn parse(&self, query: &str, start: usize) -> Option<Node> {
        let rest = &query[start..];
        let negation = match rest.chars().next() {
            Some(c) if starts_with_word_char(&rest[c.len_utf8()..]) => Negation::from_char(c),
            _ => None,
        };

        let word_start = start + usize::from(negation.is_some());
        let word_end = word_start + scan_word(&query[word_start..]);
        if word_end == word_start {
            return None;
        }

        let word = &query[word_start..word_end];
        let span = Span::new(word_start, word_end);
        let node = self.classify(word, span);

        Some(match negation {
            Some(negation) => Node::negated(Span::new(start, word_end), node, negation),
            None => node,
        })
    }

    /// Picks the node type for a consumed term.
    fn classify(&self, word: &str, span: Span) -> Node {
        if let Some(caps) = FUZZY.captures(word) {
            return Node::Fuzzy {
                span,
                text: caps["word"].to_string(),
                distance: caps
                    .name("distance")
                    .and_then(|m| m.as_str().parse().ok()),
            };
        }

        if word.contains(['*', '?']) {
            if SIMPLE_PREFIX.is_match(word) {
                return Node::Prefix {
                    span,
                    text: word.trim_end_matches('*').to_string(),
                };
            }
            if is_wildcard(word, self.escaper.allow_leading_wildcard()) {
                return Node::Wildcard {
                    span,
                    text: word.to_string(),
                };
            }
        }

        Node::words(span, self.escaper.unescape(word))
    }
}

/// Byte length of the term at the start of `text`.
///
/// A term stops at an unescaped `"`, at a blank character, or at a `-`/`!`
/// immediately followed by `"`.
fn scan_word(text: &str) -> usize {
    let mut pos = 0;
    let mut escaped_until = None;
    while let Some((at, stop)) = find_word_stop(text, pos) {
        match stop {
            '\\' => {
                pos = at + 1;
                if let Some(escaped) = text[pos..].chars().next().filter(|&c| c != '\n') {
                    pos += escaped.len_utf8();
                }
                escaped_until = Some(pos);
            }
            '"' => {
                let negated = escaped_until != Some(at)
                    && matches!(char_before(text, at), Some('-' | '!'));
                return if negated { at - 1 } else { at };
            }
            _ => return at,
        }
    }
    text.len()
}

/// Checks the wildcard shape of `word`: at most [`MAX_WILDCARDS`] unescaped
/// `*`/`?`, at least one other character, and no leading wildcard unless
/// allowed.
fn is_wildcard(word: &str, allow_leading: bool) -> bool {
    let mut wildcards = 0;
    let mut others = 0;
    let mut first = true;
    let mut chars = word.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' | '?' => {
                if first && !allow_leading {
                    return false;
                }
                wildcards += 1;
            }
            '\\' => {
                chars.next();
                others += 1;
            }
            _ => others += 1,
        }
        first = false;
    }
    wildcards > 0 && wildcards <= MAX_WILDCARDS && others > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escape::DefaultEscaper;

    fn parse(query: &str) -> Option<Node> {
        let escaper = DefaultEscaper::default();
        WordParser::new(&escaper).parse(query, 0)
    }

    #[test]
    fn plain_word_stops_at_space() {
        assert_eq!(parse("foo bar"), Some(Node::words(Span::new(0, 3), "foo")));
    }

    #[test]
    fn word_stops_at_quote() {
        assert_eq!(parse(r#"foo"bar""#), Some(Node::words(Span::new(0, 3), "foo")));
    }

    #[test]
    fn dash_inside_word_is_ordinary() {
        assert_eq!(
            parse("well-known x"),
            Some(Node::words(Span::new(0, 10), "well-known"))
        );
    }

    #[test]
    fn dash_before_quote_ends_word() {
        assert_eq!(parse(r#"foo-"bar""#), Some(Node::words(Span::new(0, 3), "foo")));
    }

    #[test]
    fn escapes_are_consumed() {
        assert_eq!(
            parse(r#"foo\"bar baz"#),
            Some(Node::words(Span::new(0, 8), r#"foo"bar"#))
        );
        assert_eq!(
            parse(r"foo\ bar"),
            Some(Node::words(Span::new(0, 8), "foo bar"))
        );
    }

    #[test]
    fn negation_needs_word_char() {
        assert_eq!(
            parse("-foo"),
            Some(Node::negated(
                Span::new(0, 4),
                Node::words(Span::new(1, 4), "foo"),
                Negation::Dash,
            ))
        );
        assert_eq!(parse("--foo"), Some(Node::words(Span::new(0, 5), "--foo")));
        assert_eq!(parse("-"), Some(Node::words(Span::new(0, 1), "-")));
    }

    #[test]
    fn fuzzy_terms() {
        assert_eq!(
            parse("foo~"),
            Some(Node::Fuzzy {
                span: Span::new(0, 4),
                text: "foo".into(),
                distance: None,
            })
        );
        assert_eq!(
            parse("foo~2"),
            Some(Node::Fuzzy {
                span: Span::new(0, 5),
                text: "foo".into(),
                distance: Some(2),
            })
        );
        assert_eq!(parse("foo~3"), Some(Node::words(Span::new(0, 5), "foo~3")));
    }

    #[test]
    fn prefix_term() {
        assert_eq!(
            parse("foo**"),
            Some(Node::Prefix {
                span: Span::new(0, 5),
                text: "foo".into(),
            })
        );
    }

    #[test]
    fn wildcard_term() {
        assert_eq!(
            parse("f?o*bar"),
            Some(Node::Wildcard {
                span: Span::new(0, 7),
                text: "f?o*bar".into(),
            })
        );
    }

    #[test]
    fn too_many_wildcards_is_words() {
        assert_eq!(
            parse("a*b*c*d*"),
            Some(Node::words(Span::new(0, 8), "a*b*c*d*"))
        );
    }

    #[test]
    fn leading_wildcard_switch() {
        assert!(matches!(parse("*foo"), Some(Node::Wildcard { .. })));

        let escaper = DefaultEscaper::new("en", false);
        let node = WordParser::new(&escaper).parse("*foo", 0);
        assert_eq!(node, Some(Node::words(Span::new(0, 4), "*foo")));
    }

    #[test]
    fn only_wildcards_is_words() {
        assert_eq!(parse("**"), Some(Node::words(Span::new(0, 2), "**")));
    }

    #[test]
    fn nothing_to_consume() {
        assert_eq!(parse(r#""quoted""#), None);
        assert_eq!(parse(r#"-"quoted""#), None);
    }

    #[test]
    fn starts_at_offset() {
        let escaper = DefaultEscaper::default();
        let node = WordParser::new(&escaper).parse("foo bar", 4);
        assert_eq!(node, Some(Node::words(Span::new(4, 7), "bar")));
    }
}
