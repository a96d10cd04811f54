//! Escape handling and language-dependent switches.

use std::fmt;

/// Removes query escaping and exposes language settings.
pub trait Escaper: fmt::Debug + Send + Sync {
    /// Removes backslash escapes from `text`.
    fn unescape(&self, text: &str) -> String;

    /// Content language code, e.g. `"en"`.
    fn language(&self) -> &str;

    /// Whether wildcard terms may start with a wildcard.
    fn allow_leading_wildcard(&self) -> bool;
}

/// Backslash escaper.
///
/// `\x` becomes `x` for any character; a trailing lone backslash is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultEscaper {
    /// Content language code.
    language: String,
    /// Leading wildcard switch.
    allow_leading_wildcard: bool,
}

impl DefaultEscaper {
    /// Creates an escaper for `language`.
    pub fn new(language: impl Into<String>, allow_leading_wildcard: bool) -> Self {
        Self {
            language: language.into(),
            allow_leading_wildcard,
        }
    }
}

impl Default for DefaultEscaper {
    fn default() -> Self {
        Self::new("en", true)
    }
}

impl Escaper for DefaultEscaper {
    fn unescape(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                match chars.next() {
                    Some(escaped) => out.push(escaped),
                    None => out.push('\\'),
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    fn language(&self) -> &str {
        &self.language
    }

    fn allow_leading_wildcard(&self) -> bool {
        self.allow_leading_wildcard
    }
}
