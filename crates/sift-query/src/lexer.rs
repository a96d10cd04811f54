//! Query tokenizer.
//!
//! Walks the cleaned query left to right, interleaving the keyword nodes
//! found beforehand with boolean operators, phrases and words scanned on the
//! fly.

use std::{collections::VecDeque, fmt, sync::LazyLock};

use regex::Regex;
use tracing::trace;

use crate::{
    ast::{Node, Span},
    error::{ParseWarning, UNBALANCED_PHRASE},
    escape::Escaper,
    phrase::PhraseParser,
    text::{blank_prefix_len, starts_with_blank},
    word::WordParser,
};

/// Explicit boolean operators, case-sensitive.
static BOOLEAN_OPERATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<and>AND|&&)|(?P<or>OR|\|\|)|(?P<not>NOT))")
        .expect("operator pattern is valid")
});

/// Kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// End of input.
    Eof,
    /// `AND` or `&&`.
    And,
    /// `OR` or `||`.
    Or,
    /// `NOT`.
    Not,
    /// A leaf node: word, phrase or keyword.
    ParsedNode,
}

impl TokenKind {
    /// Label used in warnings.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Eof => "EOF",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
            Self::ParsedNode => "PARSED_NODE",
        }
    }

    /// Returns true for `AND` and `OR`.
    pub const fn is_boolean(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A token with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What the token is.
    pub kind: TokenKind,
    /// Where the token is.
    pub span: Span,
    /// The leaf for [`TokenKind::ParsedNode`] tokens.
    node: Option<Node>,
}

impl Token {
    /// End of input at `offset`.
    pub const fn eof(offset: usize) -> Self {
        Self {
            kind: TokenKind::Eof,
            span: Span::new(offset, offset),
            node: None,
        }
    }

    /// An operator token.
    pub const fn operator(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            span,
            node: None,
        }
    }

    /// A leaf token.
    pub fn leaf(node: Node) -> Self {
        Self {
            kind: TokenKind::ParsedNode,
            span: node.span(),
            node: Some(node),
        }
    }

    /// The leaf node, if any.
    pub const fn node(&self) -> Option<&Node> {
        self.node.as_ref()
    }

    /// Moves the leaf node out of the token.
    pub fn take_node(&mut self) -> Option<Node> {
        self.node.take()
    }

    /// Returns true for a leaf holding plain words.
    pub fn is_words(&self) -> bool {
        self.node.as_ref().is_some_and(Node::is_words)
    }
}

/// Produces tokens from a cleaned query.
#[derive(Debug)]
pub struct Lexer<'a> {
    /// Cleaned query.
    query: &'a str,
    /// Next byte to scan.
    offset: usize,
    /// Keyword nodes not yet emitted, by start offset.
    keywords: VecDeque<Node>,
    /// Phrase scanner.
    phrases: PhraseParser<'a>,
    /// Word scanner.
    words: WordParser<'a>,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer starting at `offset`.
    ///
    /// `keywords` must be sorted by start offset and lie at or after
    /// `offset`.
    pub fn new(query: &'a str, offset: usize, keywords: Vec<Node>, escaper: &'a dyn Escaper) -> Self {
        Self {
            query,
            offset,
            keywords: keywords.into(),
            phrases: PhraseParser::new(escaper),
            words: WordParser::new(escaper),
        }
    }

    /// Scans the next token.
    ///
    /// The token is not consumed until [`Lexer::advance`] is called with its
    /// span.
    pub fn next_token(&mut self, warnings: &mut Vec<ParseWarning>) -> Token {
        let len = self.query.len();
        self.offset += blank_prefix_len(&self.query[self.offset..]);
        if self.offset >= len {
            return Token::eof(len);
        }

        let max_offset = self.keywords.front().map_or(len, |k| k.span().start);
        let token = if max_offset == self.offset {
            self.keywords.pop_front().map(Token::leaf)
        } else {
            None
        }
        .or_else(|| self.boolean_operator())
        .or_else(|| {
            self.phrases
                .parse(self.query, self.offset, max_offset)
                .map(Token::leaf)
        })
        .or_else(|| {
            self.words
                .parse(&self.query[..max_offset], self.offset)
                .map(Token::leaf)
        })
        .or_else(|| {
            let node = self
                .phrases
                .parse_unbalanced(self.query, self.offset, max_offset)?;
            warnings.push(ParseWarning::new(UNBALANCED_PHRASE, Some(self.offset)));
            Some(Token::leaf(node))
        });

        match token {
            Some(token) => {
                trace!(kind = %token.kind, start = token.span.start, end = token.span.end, "token");
                token
            }
            None => unreachable!(
                "no token at offset {} of {:?} (bound {max_offset})",
                self.offset, self.query
            ),
        }
    }

    /// Consumes input up to the end of `span`.
    pub fn advance(&mut self, span: Span) {
        self.offset = span.end;
    }

    /// Recognizes an operator not glued to the following text.
    fn boolean_operator(&self) -> Option<Token> {
        let rest = &self.query[self.offset..];
        let caps = BOOLEAN_OPERATOR.captures(rest)?;
        let end = caps.get(0)?.end();
        let after = &rest[end..];
        if !after.is_empty() && !after.starts_with('"') && !starts_with_blank(after) {
            return None;
        }

        let kind = if caps.name("and").is_some() {
            TokenKind::And
        } else if caps.name("or").is_some() {
            TokenKind::Or
        } else {
            TokenKind::Not
        };
        Some(Token::operator(
            kind,
            Span::new(self.offset, self.offset + end),
        ))
    }
}
