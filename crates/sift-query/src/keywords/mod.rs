//! Keyword features: `key:value` filters recognized ahead of tokenization.
//!
//! A feature describes its value grammar through [`KeywordFeature`] and
//! interprets matched values itself. Features are grouped in a
//! [`KeywordRegistry`], which fixes the order in which they are scanned.

mod builtin;
mod registry;

use std::fmt;

use serde_json::Value;

pub use self::{
    builtin::{
        ListFeature, LocalFeature, MoreLikeFeature, PreferRecentFeature, PrefixFeature,
        RegexFeature, SimpleKeyword,
    },
    registry::{KeywordRegistry, RegisteredFeature, ScanBucket},
};
use crate::{error::WarningCollector, namespace::RequiredNamespaces};

/// A character that may quote a keyword value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueDelimiter {
    /// The quoting character.
    pub delimiter: char,
    /// Literal accepted right after the closing delimiter, e.g. `i` for
    /// `/regex/i`.
    pub suffix: Option<&'static str>,
}

impl ValueDelimiter {
    /// Creates a delimiter without suffix.
    pub const fn new(delimiter: char) -> Self {
        Self {
            delimiter,
            suffix: None,
        }
    }

    /// Allows `suffix` after the closing delimiter.
    pub const fn with_suffix(mut self, suffix: &'static str) -> Self {
        self.suffix = Some(suffix);
        self
    }
}

/// Values quoted with `"` only.
pub const DOUBLE_QUOTED: &[ValueDelimiter] = &[ValueDelimiter::new('"')];

/// A matched keyword value handed to [`KeywordFeature::parse_value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordValue<'a> {
    /// The prefix as typed.
    pub key: &'a str,
    /// Value with delimiters removed and escaped delimiters unescaped.
    pub value: &'a str,
    /// Value as typed, delimiters included, suffix excluded.
    pub quoted: &'a str,
    /// Delimiter used, if the value was quoted.
    pub delimiter: Option<char>,
    /// Suffix after the closing delimiter, or empty.
    pub suffix: &'a str,
}

/// Returned by a feature that refuses a value.
///
/// Only features allowing empty values may reject; the match then falls back
/// to a bare `key:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueRejected;

/// A `key:value` filter definition.
pub trait KeywordFeature: fmt::Debug + Send + Sync {
    /// Feature name stored on produced nodes.
    fn name(&self) -> &str;

    /// Literal prefixes, matched case-sensitively before the colon.
    fn prefixes(&self) -> &[&'static str];

    /// Whether a value follows the colon.
    fn has_value(&self) -> bool {
        true
    }

    /// Whether the value extends to the end of the query.
    fn greedy(&self) -> bool {
        false
    }

    /// Whether the keyword is only accepted at the start of the query.
    fn query_header(&self) -> bool {
        false
    }

    /// Whether `key:` may be followed by nothing.
    fn allow_empty_value(&self) -> bool {
        false
    }

    /// Characters that may quote the value.
    fn value_delimiters(&self) -> &[ValueDelimiter] {
        DOUBLE_QUOTED
    }

    /// Interprets a non-empty value.
    fn parse_value(
        &self,
        _value: &KeywordValue<'_>,
        _warnings: &mut dyn WarningCollector,
    ) -> Result<Option<Value>, ValueRejected> {
        Ok(None)
    }

    /// Namespaces implied by a node of this feature.
    fn required_namespaces(&self, _parsed: Option<&Value>) -> Option<RequiredNamespaces> {
        None
    }
}
