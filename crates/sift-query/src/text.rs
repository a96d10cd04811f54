//! Character classes shared by the sub-parsers.

use std::sync::LazyLock;

use regex::Regex;

/// A leading run of blank characters (`\p{Z}` or `\p{C}`).
static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{Z}\p{C}]+").expect("blank run pattern is valid"));

/// A blank character at the end of the text.
static TRAILING_BLANK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{Z}\p{C}]$").expect("trailing blank pattern is valid"));

/// A word character (`\w`) at the start of the text.
static LEADING_WORD_CHAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w").expect("word pattern is valid"));

/// Characters a word run has to look at: quotes, backslashes and blanks.
static WORD_STOP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["\\\p{Z}\p{C}]"#).expect("word stop pattern is valid"));

/// Returns true if `text` starts with a separator or control character.
pub fn starts_with_blank(text: &str) -> bool {
    blank_prefix_len(text) > 0
}

/// Returns true if `text` ends with a separator or control character.
pub fn ends_with_blank(text: &str) -> bool {
    TRAILING_BLANK.is_match(text)
}

/// Returns true if `text` starts with a word character.
pub fn starts_with_word_char(text: &str) -> bool {
    LEADING_WORD_CHAR.is_match(text)
}

/// Finds the first quote, backslash or blank at or after byte offset `from`.
pub fn find_word_stop(text: &str, from: usize) -> Option<(usize, char)> {
    let stop = WORD_STOP.find_at(text, from)?;
    stop.as_str().chars().next().map(|c| (stop.start(), c))
}

/// Byte length of the blank run at the start of `text`.
pub fn blank_prefix_len(text: &str) -> usize {
    BLANK_RUN.find(text).map_or(0, |m| m.end())
}

/// Returns the character ending right before byte offset `at`.
pub fn char_before(text: &str, at: usize) -> Option<char> {
    text[..at].chars().next_back()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_edges() {
        assert!(starts_with_blank(" foo"));
        assert!(starts_with_blank("\u{3000}foo"));
        assert!(starts_with_blank("\u{200b}"));
        assert!(!starts_with_blank("\"foo"));
        assert!(!starts_with_blank(""));
        assert!(ends_with_blank("foo\t"));
        assert!(!ends_with_blank("foo"));
        assert!(!ends_with_blank(""));
    }

    #[test]
    fn word_character_start() {
        assert!(starts_with_word_char("a-"));
        assert!(starts_with_word_char("9"));
        assert!(starts_with_word_char("_x"));
        assert!(starts_with_word_char("é"));
        assert!(!starts_with_word_char("-a"));
        assert!(!starts_with_word_char("\"a"));
        assert!(!starts_with_word_char(""));
    }

    #[test]
    fn word_stops() {
        assert_eq!(find_word_stop("foo bar", 0), Some((3, ' ')));
        assert_eq!(find_word_stop(r"a\b", 0), Some((1, '\\')));
        assert_eq!(find_word_stop("aé\"b", 1), Some((3, '"')));
        assert_eq!(find_word_stop("a-b!c", 0), None);
        assert_eq!(find_word_stop("ab ", 3), None);
    }

    #[test]
    fn blank_prefix() {
        assert_eq!(blank_prefix_len("  \tfoo"), 3);
        assert_eq!(blank_prefix_len("foo "), 0);
        assert_eq!(blank_prefix_len(""), 0);
    }

    #[test]
    fn previous_char() {
        assert_eq!(char_before("aé b", 3), Some('é'));
        assert_eq!(char_before("abc", 0), None);
    }
}
