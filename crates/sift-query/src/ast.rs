//! Query abstract syntax tree.
//!
//! Every node carries the [`Span`] it was parsed from. Spans are byte offsets
//! into the cleaned query, so `&query[span.start..span.end]` is always valid.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::namespace::NamespaceSelector;

/// A half-open `[start, end)` byte range into the cleaned query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Span {
    /// First byte covered by the span.
    pub start: usize,
    /// One past the last byte covered by the span.
    pub end: usize,
}

impl Span {
    /// Creates a span covering `start..end`.
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length of the span in bytes.
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if the span covers nothing.
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Returns the text covered by this span.
    pub fn slice<'a>(&self, query: &'a str) -> &'a str {
        &query[self.start..self.end]
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// How a node was negated by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Negation {
    /// A leading `-`.
    #[serde(rename = "-")]
    Dash,
    /// A leading `!`.
    #[serde(rename = "!")]
    Bang,
    /// An explicit `NOT` operator.
    #[serde(rename = "NOT")]
    Not,
}

impl Negation {
    /// Maps a leading negation character to its marker.
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '-' => Some(Self::Dash),
            '!' => Some(Self::Bang),
            _ => None,
        }
    }

    /// The marker as the user typed it.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dash => "-",
            Self::Bang => "!",
            Self::Not => "NOT",
        }
    }
}

/// Occurrence of a clause inside a [`Node::Boolean`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Occur {
    /// The clause must match.
    Must,
    /// The clause must not match.
    MustNot,
    /// The clause should match.
    Should,
}

impl Occur {
    /// Upper-case label used in tree output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Must => "MUST",
            Self::MustNot => "MUST_NOT",
            Self::Should => "SHOULD",
        }
    }
}

impl fmt::Display for Occur {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One member of a boolean node.
///
/// The node never carries its own negation wrapper: negation is expressed by
/// [`Occur::MustNot`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clause {
    /// The clause payload.
    pub node: Node,
    /// How the clause participates in the boolean.
    pub occur: Occur,
    /// Whether the user wrote a connective for this clause.
    pub explicit: bool,
}

/// A `key:value` occurrence recognized by a keyword feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordNode {
    /// Span from the key to the end of the value.
    pub span: Span,
    /// Name of the feature that produced this node.
    pub feature: String,
    /// The prefix as typed, without any negation.
    pub key: String,
    /// The value with quoting removed.
    pub value: String,
    /// The value as typed, including delimiters.
    pub quoted_value: String,
    /// Delimiter that quoted the value, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<char>,
    /// Suffix following the closing delimiter.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub suffix: String,
    /// Feature-specific interpretation of the value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed_value: Option<Value>,
}

/// A parsed query node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    /// One or more bare terms folded together.
    Words {
        /// Source span.
        span: Span,
        /// Unescaped text.
        text: String,
    },

    /// A quoted phrase.
    Phrase {
        /// Source span, including any `~` suffixes.
        span: Span,
        /// Unescaped phrase text.
        text: String,
        /// Explicit slop, when given with `~N`.
        #[serde(skip_serializing_if = "Option::is_none")]
        slop: Option<u32>,
        /// Whether a trailing `~` requested stemmed matching.
        use_stem: bool,
    },

    /// A quoted phrase ending with `*`, used as a prefix query.
    PhrasePrefix {
        /// Source span.
        span: Span,
        /// Phrase text without the trailing `*`.
        text: String,
    },

    /// A `"` without a matching close before the scan boundary.
    UnbalancedPhrase {
        /// Source span.
        span: Span,
        /// Raw text following the opening quote.
        text: String,
    },

    /// A term containing wildcard characters.
    Wildcard {
        /// Source span.
        span: Span,
        /// Raw term, wildcards included.
        text: String,
    },

    /// A simple prefix term such as `foo*`.
    Prefix {
        /// Source span.
        span: Span,
        /// Term without the trailing `*`.
        text: String,
    },

    /// A fuzzy term such as `foo~1`.
    Fuzzy {
        /// Source span.
        span: Span,
        /// Term without the `~` suffix.
        text: String,
        /// Maximum edit distance, when given.
        #[serde(skip_serializing_if = "Option::is_none")]
        distance: Option<u8>,
    },

    /// A keyword feature occurrence.
    Keyword(KeywordNode),

    /// A negated node.
    Negated {
        /// Span including the negation marker.
        span: Span,
        /// The negated node.
        inner: Box<Self>,
        /// How the negation was written.
        negation: Negation,
    },

    /// A boolean combination of clauses.
    Boolean {
        /// Span from the first clause start to the last clause end.
        span: Span,
        /// Clauses in query order.
        clauses: Vec<Clause>,
    },

    /// A namespace selection written at the start of the query.
    NamespaceHeader {
        /// Source span.
        span: Span,
        /// The selected namespace.
        namespace: NamespaceSelector,
    },

    /// Produced when the query contains no tokens at all.
    Empty {
        /// Span of the whole query.
        span: Span,
    },
}

impl Node {
    /// Returns the span this node was parsed from.
    pub const fn span(&self) -> Span {
        match self {
            Self::Words { span, .. }
            | Self::Phrase { span, .. }
            | Self::PhrasePrefix { span, .. }
            | Self::UnbalancedPhrase { span, .. }
            | Self::Wildcard { span, .. }
            | Self::Prefix { span, .. }
            | Self::Fuzzy { span, .. }
            | Self::Negated { span, .. }
            | Self::Boolean { span, .. }
            | Self::NamespaceHeader { span, .. }
            | Self::Empty { span } => *span,
            Self::Keyword(keyword) => keyword.span,
        }
    }

    /// Creates a plain words node.
    pub fn words(span: Span, text: impl Into<String>) -> Self {
        Self::Words {
            span,
            text: text.into(),
        }
    }

    /// Wraps `inner` in a negation covering `span`.
    pub fn negated(span: Span, inner: Self, negation: Negation) -> Self {
        Self::Negated {
            span,
            inner: Box::new(inner),
            negation,
        }
    }

    /// Returns true for a plain [`Node::Words`] node.
    pub const fn is_words(&self) -> bool {
        matches!(self, Self::Words { .. })
    }

    /// Returns true for a [`Node::Negated`] node.
    pub const fn is_negated(&self) -> bool {
        matches!(self, Self::Negated { .. })
    }

    /// Returns the keyword payload of this node, looking through negation.
    pub fn as_keyword(&self) -> Option<&KeywordNode> {
        match self {
            Self::Keyword(keyword) => Some(keyword),
            Self::Negated { inner, .. } => inner.as_keyword(),
            _ => None,
        }
    }

    /// Visits every keyword node of this tree in query order.
    pub fn visit_keywords<'a>(&'a self, visit: &mut impl FnMut(&'a KeywordNode)) {
        match self {
            Self::Keyword(keyword) => visit(keyword),
            Self::Negated { inner, .. } => inner.visit_keywords(visit),
            Self::Boolean { clauses, .. } => {
                for clause in clauses {
                    clause.node.visit_keywords(visit);
                }
            }
            _ => {}
        }
    }

    /// Short name of the node kind.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Words { .. } => "Words",
            Self::Phrase { .. } => "Phrase",
            Self::PhrasePrefix { .. } => "PhrasePrefix",
            Self::UnbalancedPhrase { .. } => "UnbalancedPhrase",
            Self::Wildcard { .. } => "Wildcard",
            Self::Prefix { .. } => "Prefix",
            Self::Fuzzy { .. } => "Fuzzy",
            Self::Keyword(_) => "Keyword",
            Self::Negated { .. } => "Negated",
            Self::Boolean { .. } => "Boolean",
            Self::NamespaceHeader { .. } => "NamespaceHeader",
            Self::Empty { .. } => "Empty",
        }
    }

    /// Formats the node as a tree structure with the given indentation level.
    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let prefix = "  ".repeat(indent);
        let span = self.span();
        match self {
            Self::Words { text, .. }
            | Self::PhrasePrefix { text, .. }
            | Self::UnbalancedPhrase { text, .. }
            | Self::Wildcard { text, .. }
            | Self::Prefix { text, .. } => {
                writeln!(f, "{prefix}{}({text:?}) {span}", self.kind())
            }
            Self::Phrase {
                text,
                slop,
                use_stem,
                ..
            } => {
                write!(f, "{prefix}Phrase({text:?}")?;
                if let Some(slop) = slop {
                    write!(f, ", slop={slop}")?;
                }
                if *use_stem {
                    write!(f, ", stem")?;
                }
                writeln!(f, ") {span}")
            }
            Self::Fuzzy { text, distance, .. } => match distance {
                Some(d) => writeln!(f, "{prefix}Fuzzy({text:?}, distance={d}) {span}"),
                None => writeln!(f, "{prefix}Fuzzy({text:?}) {span}"),
            },
            Self::Keyword(keyword) => writeln!(
                f,
                "{prefix}Keyword({}:{}) {span}",
                keyword.key, keyword.quoted_value
            ),
            Self::Negated {
                inner, negation, ..
            } => {
                writeln!(f, "{prefix}Negated({}) {span}", negation.as_str())?;
                inner.fmt_tree(f, indent + 1)
            }
            Self::Boolean { clauses, .. } => {
                writeln!(f, "{prefix}Boolean {span}")?;
                for clause in clauses {
                    let marker = if clause.explicit { "" } else { "~" };
                    writeln!(f, "{prefix}  {marker}{}", clause.occur)?;
                    clause.node.fmt_tree(f, indent + 2)?;
                }
                Ok(())
            }
            Self::NamespaceHeader { namespace, .. } => {
                writeln!(f, "{prefix}NamespaceHeader({namespace}) {span}")
            }
            Self::Empty { .. } => writeln!(f, "{prefix}Empty {span}"),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyword(span: Span, key: &str, value: &str) -> Node {
        Node::Keyword(KeywordNode {
            span,
            feature: key.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            quoted_value: value.to_string(),
            delimiter: None,
            suffix: String::new(),
            parsed_value: None,
        })
    }

    #[test]
    fn span_slices_query() {
        let span = Span::new(4, 7);
        assert_eq!(span.slice("foo bar baz"), "bar");
        assert_eq!(span.len(), 3);
        assert!(!span.is_empty());
        assert_eq!(span.to_string(), "[4, 7)");
    }

    #[test]
    fn negation_from_char() {
        assert_eq!(Negation::from_char('-'), Some(Negation::Dash));
        assert_eq!(Negation::from_char('!'), Some(Negation::Bang));
        assert_eq!(Negation::from_char('x'), None);
    }

    #[test]
    fn keyword_seen_through_negation() {
        let node = Node::negated(
            Span::new(0, 12),
            keyword(Span::new(1, 12), "intitle", "foo"),
            Negation::Dash,
        );
        assert_eq!(node.as_keyword().map(|k| k.key.as_str()), Some("intitle"));
        assert!(node.is_negated());
        assert!(!node.is_words());
    }

    #[test]
    fn visit_keywords_in_order() {
        let root = Node::Boolean {
            span: Span::new(0, 30),
            clauses: vec![
                Clause {
                    node: keyword(Span::new(0, 10), "intitle", "a"),
                    occur: Occur::Must,
                    explicit: false,
                },
                Clause {
                    node: Node::words(Span::new(11, 14), "foo"),
                    occur: Occur::Must,
                    explicit: false,
                },
                Clause {
                    node: keyword(Span::new(15, 30), "incategory", "b"),
                    occur: Occur::MustNot,
                    explicit: false,
                },
            ],
        };

        let mut keys = Vec::new();
        root.visit_keywords(&mut |k| keys.push(k.key.clone()));
        assert_eq!(keys, vec!["intitle", "incategory"]);
    }

    #[test]
    fn display_tree() {
        let root = Node::Boolean {
            span: Span::new(0, 9),
            clauses: vec![
                Clause {
                    node: Node::words(Span::new(0, 3), "foo"),
                    occur: Occur::Should,
                    explicit: true,
                },
                Clause {
                    node: Node::words(Span::new(7, 9), "ba"),
                    occur: Occur::Should,
                    explicit: false,
                },
            ],
        };

        let expected = "Boolean [0, 9)\n  SHOULD\n    Words(\"foo\") [0, 3)\n  ~SHOULD\n    Words(\"ba\") [7, 9)\n";
        assert_eq!(root.to_string(), expected);
    }

    #[test]
    fn serializes_with_type_tag() {
        let node = Node::Phrase {
            span: Span::new(0, 9),
            text: "red car".into(),
            slop: None,
            use_stem: false,
        };
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "phrase");
        assert_eq!(json["text"], "red car");
        assert!(json.get("slop").is_none());
    }
}
