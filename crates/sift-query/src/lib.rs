//! Query-string parsing for sift.
//!
//! This crate turns a user-typed search query into a tree:
//!
//! - **Words**: `rust async` - plain terms, folded into one node
//! - **Phrases**: `"error handling"`, `"error handling"~2`, `"error hand*"`
//! - **Special terms**: `fo*`, `f?o`, `foo~1`
//! - **Negation**: `-deprecated`, `!deprecated`, `NOT deprecated`
//! - **Operators**: `rust AND golang`, `rust || golang`
//! - **Keywords**: `intitle:guide`, `incategory:"Rust books"`, `prefix:help:Ru`
//! - **Namespace header**: `help:query` restricts the search to one namespace
//!
//! Parsing never fails on malformed input: errors are recovered from and
//! reported as [`ParseWarning`]s. Only over-long queries are rejected.
//!
//! # Example
//!
//! ```
//! use sift_query::{Occur, Node, parse};
//!
//! let parsed = parse("intitle:guide rust -deprecated").unwrap();
//! let Node::Boolean { clauses, .. } = parsed.root() else { panic!() };
//! assert_eq!(clauses.len(), 3);
//! assert_eq!(clauses[2].occur, Occur::MustNot);
//! assert_eq!(parsed.features_used(), vec!["intitle"]);
//! ```

#![warn(missing_docs)]

mod ast;
mod classify;
mod cleanup;
mod error;
mod escape;
mod keyword;
pub mod keywords;
mod lexer;
mod namespace;
mod parser;
mod phrase;
mod query;
mod settings;
mod span;
mod text;
mod word;

pub use ast::{Clause, KeywordNode, Negation, Node, Occur, Span};
pub use classify::{
    BAG_OF_WORDS_WITH_PHRASE, BOGUS_QUERY, BasicQueryClassifier, COMPLEX_QUERY,
    ClassifierRepository, QueryClassifier, SIMPLE_BAG_OF_WORDS, SIMPLE_PHRASE,
};
pub use cleanup::{CleanQuery, Cleanup, QuestionMarkStripLevel, clean_query, strip_question_marks};
pub use error::{
    ClassifierError, DOUBLE_NEGATION, ParseWarning, QUERY_TOO_LONG, QueryError, RegistryError,
    UNBALANCED_PHRASE, UNEXPECTED_END, UNEXPECTED_TOKEN, UnknownStripLevel, WarningCollector,
};
pub use escape::{DefaultEscaper, Escaper};
pub use keyword::KeywordMatcher;
pub use keywords::{KeywordFeature, KeywordRegistry};
pub use lexer::{Lexer, Token, TokenKind};
pub use namespace::{
    NS_MAIN, NamespacePrefixParser, NamespaceSelector, RequiredNamespaces, StaticNamespaces,
};
pub use parser::{Parser, parse};
pub use query::{NAMESPACE_HEADER_FEATURE, ParsedQuery};
pub use settings::{
    DEFAULT_MAX_QUERY_LENGTH, ParserSettings, QUERY_LEN_HARD_LIMIT, UNLIMITED_KEYWORDS,
};
pub use span::SpanTracker;
