//! Query parser.
//!
//! Parsing runs in four passes over the query:
//!
//! 1. cleanup (question marks, gershayim, tilde header) and namespace header
//!    detection;
//! 2. keyword scanning, one feature at a time in [`ScanBucket`] order;
//! 3. a single left-to-right token pass building the boolean tree;
//! 4. collection of the namespaces required by keyword nodes.
//!
//! # Precedence
//!
//! Boolean operators bind the clause on their *left*:
//!
//! - `A AND B OR C` is `MUST A, SHOULD B, SHOULD C`
//! - `A OR B AND C` is `SHOULD A, MUST B, MUST C`
//!
//! Negation is always `MUST_NOT`, so `A OR NOT B` is `SHOULD A, MUST_NOT B`.
//! Adjacent plain words fold into a single [`Node::Words`].
//!
//! # Recovery
//!
//! Syntax errors never fail the parse:
//!
//! - `NOT` at the end of the query becomes a word
//! - `AND`/`OR` where a leaf is expected becomes a word
//! - `NOT !foo` drops both negations
//!
//! each with a [`ParseWarning`].
//!
//! [`ScanBucket`]: crate::keywords::ScanBucket

use std::{
    mem,
    sync::{Arc, LazyLock},
};

use tracing::debug;

use crate::{
    ast::{Clause, Negation, Node, Occur, Span},
    classify::ClassifierRepository,
    cleanup::{QuestionMarkStripLevel, clean_query},
    error::{
        DOUBLE_NEGATION, ParseWarning, QueryError, RegistryError, UNEXPECTED_END,
        UNEXPECTED_TOKEN,
    },
    escape::{DefaultEscaper, Escaper},
    keywords::KeywordRegistry,
    lexer::{Lexer, Token, TokenKind},
    namespace::{NamespacePrefixParser, RequiredNamespaces, StaticNamespaces},
    query::ParsedQuery,
    settings::{DEFAULT_MAX_QUERY_LENGTH, ParserSettings, QUERY_LEN_HARD_LIMIT, UNLIMITED_KEYWORDS},
    span::SpanTracker,
};

/// Labels accepted where a leaf is expected after an operator.
const LEAF_OR_NOT: &[&str] = &["NOT", "PARSED_NODE"];

/// Labels accepted after `NOT`.
const LEAF: &[&str] = &["PARSED_NODE"];

/// Parser with the built-in features and wiki namespaces, used by [`parse`].
static DEFAULT_PARSER: LazyLock<Parser> = LazyLock::new(|| {
    Parser::from_settings(
        &ParserSettings::default(),
        Arc::new(StaticNamespaces::wiki_defaults()),
    )
    .expect("built-in keyword features are valid")
});

/// Parses `query` with the default parser.
///
/// # Example
///
/// ```
/// use sift_query::{Node, parse};
///
/// let parsed = parse("incategory:Foo bar baz").unwrap();
/// assert!(matches!(parsed.root(), Node::Boolean { .. }));
/// ```
pub fn parse(query: &str) -> Result<ParsedQuery, QueryError> {
    DEFAULT_PARSER.parse(query)
}

/// A configured query parser.
///
/// A parser holds no per-query state; [`Parser::parse`] can be called from
/// several threads at once.
#[derive(Debug)]
pub struct Parser {
    /// Keyword features.
    registry: KeywordRegistry,
    /// Escape handling and language switches.
    escaper: Box<dyn Escaper>,
    /// Namespace header resolver.
    namespaces: Arc<dyn NamespacePrefixParser>,
    /// Classifiers attached to parsed queries.
    classifiers: Arc<ClassifierRepository>,
    /// Question mark cleanup level.
    question_marks: QuestionMarkStripLevel,
    /// Cleaned query length limit.
    max_query_length: usize,
}

impl Parser {
    /// Creates a parser from its collaborators, with default limits.
    pub fn new(
        registry: KeywordRegistry,
        escaper: impl Escaper + 'static,
        namespaces: Arc<dyn NamespacePrefixParser>,
    ) -> Self {
        Self {
            registry,
            escaper: Box::new(escaper),
            namespaces,
            classifiers: Arc::new(ClassifierRepository::default()),
            question_marks: QuestionMarkStripLevel::default(),
            max_query_length: DEFAULT_MAX_QUERY_LENGTH,
        }
    }

    /// Creates a parser with the built-in keyword features.
    pub fn from_settings(
        settings: &ParserSettings,
        namespaces: Arc<dyn NamespacePrefixParser>,
    ) -> Result<Self, RegistryError> {
        let registry = KeywordRegistry::builtin(Arc::clone(&namespaces))?;
        let escaper = DefaultEscaper::new(settings.language.clone(), settings.allow_leading_wildcard);
        Ok(Self::new(registry, escaper, namespaces)
            .with_question_marks(settings.question_marks)
            .with_max_query_length(settings.max_query_length))
    }

    /// Sets the question mark cleanup level.
    pub const fn with_question_marks(mut self, level: QuestionMarkStripLevel) -> Self {
        self.question_marks = level;
        self
    }

    /// Sets the cleaned query length limit.
    pub const fn with_max_query_length(mut self, max: usize) -> Self {
        self.max_query_length = max;
        self
    }

    /// Sets the classifiers attached to parsed queries.
    pub fn with_classifiers(mut self, classifiers: Arc<ClassifierRepository>) -> Self {
        self.classifiers = classifiers;
        self
    }

    /// The keyword features of this parser.
    pub const fn registry(&self) -> &KeywordRegistry {
        &self.registry
    }

    /// Parses a raw query.
    ///
    /// Fails only when the query is too long.
    pub fn parse(&self, raw: &str) -> Result<ParsedQuery, QueryError> {
        let raw_len = raw.chars().count();
        if raw_len > QUERY_LEN_HARD_LIMIT {
            return Err(QueryError::too_long(raw_len, QUERY_LEN_HARD_LIMIT));
        }

        let cleaned = clean_query(raw, self.question_marks, self.escaper.language());
        let query = cleaned.query.as_str();
        let (namespace_header, offset) = self.namespace_header(query);

        let mut warnings = Vec::new();
        let keywords = self.scan_keywords(query, offset, &mut warnings);
        self.check_length(query, &keywords)?;

        let root = ExpressionParser::new(query, offset, keywords, self.escaper.as_ref(), &mut warnings)
            .expression();
        let required_namespaces = self.required_namespaces(&root);
        debug!(
            kind = root.kind(),
            warnings = warnings.len(),
            ?required_namespaces,
            "query parsed"
        );

        Ok(ParsedQuery {
            root,
            query: cleaned.query,
            raw_query: raw.to_string(),
            cleanups: cleaned.cleanups,
            namespace_header,
            required_namespaces,
            warnings,
            classifiers: Arc::clone(&self.classifiers),
        })
    }

    /// Detects a namespace prefix, returning the header node and the offset
    /// where the rest of the query starts.
    fn namespace_header(&self, query: &str) -> (Option<Node>, usize) {
        let Some((remainder, namespace)) = self.namespaces.parse(query) else {
            return (None, 0);
        };
        let offset = query.len().saturating_sub(remainder.len());
        if !query.is_char_boundary(offset) || !query.ends_with(remainder) {
            debug!(remainder, "namespace resolver returned a foreign remainder, ignoring");
            return (None, 0);
        }
        debug!(%namespace, offset, "namespace header");
        let header = Node::NamespaceHeader {
            span: Span::new(0, offset),
            namespace,
        };
        (Some(header), offset)
    }

    /// Runs every keyword feature over `query`, returning keyword nodes
    /// sorted by start offset.
    fn scan_keywords(&self, query: &str, offset: usize, warnings: &mut Vec<ParseWarning>) -> Vec<Node> {
        let mut tracker = SpanTracker::new();
        let mut keywords = Vec::new();
        for registered in self.registry.scan_order() {
            let nodes = registered
                .matcher()
                .scan(query, registered.feature(), &tracker, offset, warnings);
            tracker.append_nodes(&nodes);
            keywords.extend(nodes);
        }
        keywords.sort_by_key(|node| node.span().start);
        keywords
    }

    /// Checks the cleaned query against the length limit, widened by the
    /// length of exempted keywords.
    fn check_length(&self, query: &str, keywords: &[Node]) -> Result<(), QueryError> {
        let exempted: usize = keywords
            .iter()
            .filter(|node| {
                node.as_keyword()
                    .is_some_and(|k| UNLIMITED_KEYWORDS.contains(&k.key.as_str()))
            })
            .map(|node| node.span().slice(query).chars().count())
            .sum();
        let max = self.max_query_length + exempted;
        let length = query.chars().count();
        if length > max {
            return Err(QueryError::too_long(length, max));
        }
        Ok(())
    }

    /// Unions the namespaces required by keyword nodes of `root`.
    fn required_namespaces(&self, root: &Node) -> RequiredNamespaces {
        let mut required = RequiredNamespaces::default();
        root.visit_keywords(&mut |keyword| {
            if required.is_all() {
                return;
            }
            let implied = self
                .registry
                .get(&keyword.feature)
                .and_then(|feature| feature.required_namespaces(keyword.parsed_value.as_ref()));
            if let Some(implied) = implied {
                required.union(implied);
            }
        });
        required
    }
}

/// Builds the boolean tree from the token stream of one query.
struct ExpressionParser<'a> {
    /// Cleaned query.
    query: &'a str,
    /// Unescapes merged words.
    escaper: &'a dyn Escaper,
    /// Token source.
    lexer: Lexer<'a>,
    /// Current token.
    token: Token,
    /// Token before the current one.
    look_behind: Token,
    /// Collected warnings.
    warnings: &'a mut Vec<ParseWarning>,
}

impl<'a> ExpressionParser<'a> {
    /// Creates a parser over `query` starting at `offset`.
    fn new(
        query: &'a str,
        offset: usize,
        keywords: Vec<Node>,
        escaper: &'a dyn Escaper,
        warnings: &'a mut Vec<ParseWarning>,
    ) -> Self {
        Self {
            query,
            escaper,
            lexer: Lexer::new(query, offset, keywords, escaper),
            token: Token::eof(offset),
            look_behind: Token::eof(offset),
            warnings,
        }
    }

    /// Parses the whole token stream.
    fn expression(mut self) -> Node {
        let mut clauses = Vec::new();
        let mut left: Option<Node> = None;
        // Operator read in the previous iteration.
        let mut last_bool: Option<TokenKind> = None;
        let mut explicit_negation = false;

        while self.next_token() {
            let Some(current) = left.take() else {
                left = Some(if self.is_leaf() {
                    self.negated_leaf()
                } else {
                    self.fallback_to_word(LEAF_OR_NOT)
                });
                continue;
            };

            let negation_before = mem::take(&mut explicit_negation);
            let before_last = last_bool.take();
            let next = match self.token.kind {
                TokenKind::Not => {
                    self.advance();
                    if self.next_token() {
                        explicit_negation = true;
                        clauses.push(create_clause(current, false, None));
                        self.explicitly_negated_node()
                    } else {
                        let node = self.unexpected_eof(LEAF);
                        self.merge_or_push(current, node, before_last.is_some(), &mut clauses)
                    }
                }
                TokenKind::ParsedNode => {
                    if current.is_words() && self.token.is_words() {
                        // Merging wins: an operator right before mergeable
                        // words stays pending.
                        last_bool = before_last;
                        self.collapse_words(&current)
                    } else {
                        let explicit = negation_before || before_last.is_some();
                        clauses.push(create_clause(current, explicit, None));
                        self.leaf()
                    }
                }
                TokenKind::And | TokenKind::Or => {
                    let operator = self.token.kind;
                    last_bool = Some(operator);
                    self.advance();
                    if !self.next_token() {
                        last_bool = before_last;
                        let node = self.unexpected_eof(LEAF_OR_NOT);
                        self.merge_or_push(current, node, before_last.is_some(), &mut clauses)
                    } else if self.is_leaf() {
                        let node = self.negated_leaf();
                        clauses.push(create_clause(current, true, Some(occur_for(operator))));
                        node
                    } else {
                        clauses.push(create_clause(current, false, None));
                        self.fallback_to_word(LEAF_OR_NOT)
                    }
                }
                TokenKind::Eof => unreachable!("EOF token inside the expression loop"),
            };
            left = Some(next);
        }

        let Some(left) = left else {
            return Node::Empty {
                span: Span::new(0, self.query.len()),
            };
        };

        if !clauses.is_empty() {
            let clause = match last_bool {
                Some(operator) => create_clause(left, true, Some(occur_for(operator))),
                None => create_clause(left, explicit_negation, None),
            };
            clauses.push(clause);
            return bool_node(clauses);
        }
        if left.is_negated() {
            return bool_node(vec![create_clause(left, false, None)]);
        }
        left
    }

    /// Reads the next token, keeping the current one as look-behind.
    ///
    /// Returns false at end of input.
    fn next_token(&mut self) -> bool {
        let next = self.lexer.next_token(self.warnings);
        self.look_behind = mem::replace(&mut self.token, next);
        self.token.kind != TokenKind::Eof
    }

    /// Consumes the current token.
    fn advance(&mut self) {
        self.lexer.advance(self.token.span);
    }

    /// Returns true if the current token can start a leaf.
    const fn is_leaf(&self) -> bool {
        matches!(self.token.kind, TokenKind::ParsedNode | TokenKind::Not)
    }

    /// Consumes the current leaf token.
    fn leaf(&mut self) -> Node {
        self.advance();
        match self.token.take_node() {
            Some(node) => node,
            None => unreachable!("{} token has no node", self.token.kind),
        }
    }

    /// Parses a leaf, possibly preceded by `NOT`.
    fn negated_leaf(&mut self) -> Node {
        if self.token.kind != TokenKind::Not {
            return self.leaf();
        }
        self.advance();
        if self.next_token() {
            self.explicitly_negated_node()
        } else {
            self.unexpected_eof(LEAF)
        }
    }

    /// Parses the node following `NOT`.
    fn explicitly_negated_node(&mut self) -> Node {
        if self.token.kind != TokenKind::ParsedNode {
            return self.fallback_to_word(LEAF);
        }

        match self.leaf() {
            Node::Negated { span, inner, .. } => {
                self.warnings
                    .push(ParseWarning::new(DOUBLE_NEGATION, Some(span.start)));
                *inner
            }
            node => {
                let span = Span::new(self.look_behind.span.start, node.span().end);
                Node::negated(span, node, Negation::Not)
            }
        }
    }

    /// Reads the current token as a plain word, with a warning.
    fn fallback_to_word(&mut self, expected: &[&str]) -> Node {
        let span = self.token.span;
        self.warnings.push(
            ParseWarning::new(UNEXPECTED_TOKEN, Some(span.start))
                .with_tokens(expected, self.token.kind.label()),
        );
        self.advance();
        Node::words(span, span.slice(self.query))
    }

    /// Reads the look-behind operator as a plain word after input ended.
    fn unexpected_eof(&mut self, expected: &[&str]) -> Node {
        self.warnings.push(
            ParseWarning::new(UNEXPECTED_END, Some(self.query.len()))
                .with_tokens(expected, self.token.kind.label()),
        );
        let span = self.look_behind.span;
        Node::words(span, span.slice(self.query))
    }

    /// Folds the current words token into `left`.
    fn collapse_words(&mut self, left: &Node) -> Node {
        let span = Span::new(left.span().start, self.token.span.end);
        self.advance();
        Node::words(span, self.escaper.unescape(span.slice(self.query)))
    }

    /// Joins two words nodes and everything between them.
    fn merge_words(&self, left: &Node, right: &Node) -> Node {
        let span = Span::new(left.span().start, right.span().end);
        Node::words(span, self.escaper.unescape(span.slice(self.query)))
    }

    /// Handles a dangling operator at end of input: merged into `left` if it
    /// holds words, otherwise `left` becomes a clause and `node` the new left.
    fn merge_or_push(&self, left: Node, node: Node, explicit: bool, clauses: &mut Vec<Clause>) -> Node {
        if left.is_words() {
            self.merge_words(&left, &node)
        } else {
            clauses.push(create_clause(left, explicit, None));
            node
        }
    }
}

/// Occurrence implied by a boolean operator.
const fn occur_for(operator: TokenKind) -> Occur {
    match operator {
        TokenKind::Or => Occur::Should,
        _ => Occur::Must,
    }
}

/// Wraps `node` in a clause. Negated nodes always become `MUST_NOT`.
fn create_clause(node: Node, explicit: bool, occur: Option<Occur>) -> Clause {
    match node {
        Node::Negated {
            inner, negation, ..
        } => Clause {
            node: *inner,
            occur: Occur::MustNot,
            explicit: explicit || negation == Negation::Not,
        },
        node => Clause {
            node,
            occur: occur.unwrap_or(Occur::Must),
            explicit,
        },
    }
}

/// Builds a boolean node spanning its clauses.
fn bool_node(clauses: Vec<Clause>) -> Node {
    let start = clauses.first().map_or(0, |c| c.node.span().start);
    let end = clauses.last().map_or(0, |c| c.node.span().end);
    Node::Boolean {
        span: Span::new(start, end),
        clauses,
    }
}
