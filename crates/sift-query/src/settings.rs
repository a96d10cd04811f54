//! Parser settings.

use serde::Serialize;

use crate::cleanup::QuestionMarkStripLevel;

/// Absolute limit on the raw query length, in characters.
pub const QUERY_LEN_HARD_LIMIT: usize = 2048;

/// Default limit on the cleaned query length, in characters.
pub const DEFAULT_MAX_QUERY_LENGTH: usize = 300;

/// Keywords whose occurrences do not count against the length limit.
pub const UNLIMITED_KEYWORDS: &[&str] = &["incategory", "articletopic"];

/// Tunable parser behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParserSettings {
    /// Question mark stripping applied during cleanup.
    pub question_marks: QuestionMarkStripLevel,
    /// Maximum cleaned query length in characters, before keyword exemptions.
    pub max_query_length: usize,
    /// Content language code.
    pub language: String,
    /// Whether wildcard terms may start with a wildcard.
    pub allow_leading_wildcard: bool,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            question_marks: QuestionMarkStripLevel::default(),
            max_query_length: DEFAULT_MAX_QUERY_LENGTH,
            language: "en".to_string(),
            allow_leading_wildcard: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = ParserSettings::default();
        assert_eq!(settings.question_marks, QuestionMarkStripLevel::Final);
        assert_eq!(settings.max_query_length, 300);
        assert_eq!(settings.language, "en");
        assert!(settings.allow_leading_wildcard);
    }
}
