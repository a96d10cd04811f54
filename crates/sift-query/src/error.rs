//! Error and warning types for query parsing.
//!
//! Parsing never fails on malformed syntax: problems are reported as
//! [`ParseWarning`]s next to a best-effort tree. The only hard failure is a
//! query that exceeds a length limit.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Message key for an over-long query.
pub const QUERY_TOO_LONG: &str = "query-too-long";

/// Message key for a token found where a leaf was expected.
pub const UNEXPECTED_TOKEN: &str = "parse-error-unexpected-token";

/// Message key for input ending where a leaf was expected.
pub const UNEXPECTED_END: &str = "parse-error-unexpected-end";

/// Message key for `NOT` applied to an already negated node.
pub const DOUBLE_NEGATION: &str = "parse-error-double-negation";

/// Message key for an unterminated phrase.
pub const UNBALANCED_PHRASE: &str = "parse-error-unbalanced-phrase";

/// Fatal query error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The query has more characters than allowed.
    #[error("query is too long: {length} characters, the limit is {max}")]
    TooLong {
        /// Message key for user display.
        message_key: &'static str,
        /// Length of the offending query in characters.
        length: usize,
        /// Maximum accepted length in characters.
        max: usize,
    },
}

impl QueryError {
    /// Creates a too-long error.
    pub const fn too_long(length: usize, max: usize) -> Self {
        Self::TooLong {
            message_key: QUERY_TOO_LONG,
            length,
            max,
        }
    }

    /// Message key for user display.
    pub const fn message_key(&self) -> &'static str {
        match self {
            Self::TooLong { message_key, .. } => message_key,
        }
    }
}

/// Error building a keyword registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Two features share a name.
    #[error("keyword feature {0:?} is registered twice")]
    Duplicate(String),

    /// The feature declares no prefixes.
    #[error("keyword feature {0:?} has no prefixes")]
    NoPrefixes(String),

    /// Greedy features capture the rest of the query and cannot be empty.
    #[error("keyword feature {0:?} is greedy and cannot allow empty values")]
    GreedyWithEmptyValue(String),

    /// The matcher for the feature could not be compiled.
    #[error("keyword feature {name:?} has an invalid pattern: {source}")]
    InvalidPattern {
        /// Feature name.
        name: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },
}

/// An unrecognized question mark strip level name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown question mark strip level {0:?}, expected none, final, break or all")]
pub struct UnknownStripLevel(pub String);

/// Error looking up a query classifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifierError {
    /// No registered classifier produces the class.
    #[error("unknown query class: {0}")]
    UnknownClass(String),
}

/// A recovered parse problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    /// Message key.
    pub message: String,
    /// Byte offset in the cleaned query, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    /// Token labels that would have been accepted.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub expected: Vec<String>,
    /// Label of the token actually found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    /// Extra message parameters.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
}

impl ParseWarning {
    /// Creates a warning with only a message key and position.
    pub fn new(message: impl Into<String>, position: Option<usize>) -> Self {
        Self {
            message: message.into(),
            position,
            expected: Vec::new(),
            actual: None,
            params: Vec::new(),
        }
    }

    /// Records the expected and actual token labels.
    pub fn with_tokens(mut self, expected: &[&str], actual: &str) -> Self {
        self.expected = expected.iter().map(|s| (*s).to_string()).collect();
        self.actual = Some(actual.to_string());
        self
    }

    /// Records extra message parameters.
    pub fn with_params<S: AsRef<str>>(mut self, params: &[S]) -> Self {
        self.params = params.iter().map(|p| p.as_ref().to_string()).collect();
        self
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(position) = self.position {
            write!(f, " at {position}")?;
        }
        if !self.expected.is_empty() {
            write!(f, ": expected {}", self.expected.join(" or "))?;
            if let Some(actual) = &self.actual {
                write!(f, ", found {actual}")?;
            }
        }
        if !self.params.is_empty() {
            write!(f, " ({})", self.params.join(", "))?;
        }
        Ok(())
    }
}

/// Sink for warnings emitted while a keyword value is parsed.
///
/// Implementations bind the position, so features only supply the message.
pub trait WarningCollector {
    /// Records a warning with the given message key and parameters.
    fn add_warning(&mut self, message: &str, params: &[&str]);
}

/// Collector that attaches every warning to a fixed position.
#[derive(Debug)]
pub struct PositionedWarnings<'w> {
    /// Position recorded on each warning.
    position: usize,
    /// Destination list.
    warnings: &'w mut Vec<ParseWarning>,
}

impl<'w> PositionedWarnings<'w> {
    /// Creates a collector writing into `warnings` at `position`.
    pub const fn new(position: usize, warnings: &'w mut Vec<ParseWarning>) -> Self {
        Self { position, warnings }
    }
}

impl WarningCollector for PositionedWarnings<'_> {
    fn add_warning(&mut self, message: &str, params: &[&str]) {
        self.warnings
            .push(ParseWarning::new(message, Some(self.position)).with_params(params));
    }
}
