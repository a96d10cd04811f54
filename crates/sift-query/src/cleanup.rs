//! Cosmetic rewrites applied to the raw query before parsing.
//!
//! Offsets of the parsed tree refer to the cleaned string, never to the raw
//! one.

use std::{collections::BTreeSet, fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::{error::UnknownStripLevel, text::char_before};

/// Queries made only of punctuation and spaces are left alone.
static ONLY_PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[[:punct:]]|\s|¿)+$").expect("punctuation pattern is valid")
});

/// Runs of `?` followed by a non-letter or the end of the query.
static BREAKING_MARKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?+(\PL|$)").expect("break pattern is valid"));

/// Runs of `?`.
static MARKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?+").expect("marks pattern is valid"));

/// Hebrew acronyms written with a plain double quote, e.g. `צה"ל`.
static GERSHAYIM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\p{L}{2,})"(\p{L})"#).expect("gershayim pattern is valid"));

/// A cleanup that changed the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cleanup {
    /// Question marks were stripped.
    QuestionMarkStripping,
    /// Hebrew gershayim were escaped.
    GershayimQuirks,
    /// A leading `~` was removed.
    TildeHeader,
}

impl fmt::Display for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::QuestionMarkStripping => "question_mark_stripping",
            Self::GershayimQuirks => "gershayim_quirks",
            Self::TildeHeader => "tilde_header",
        })
    }
}

/// How aggressively question marks are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionMarkStripLevel {
    /// Keep every question mark.
    None,
    /// Strip trailing question marks.
    #[default]
    Final,
    /// Strip question marks at word breaks.
    Break,
    /// Strip every unescaped question mark.
    All,
}

impl QuestionMarkStripLevel {
    /// Configuration name of the level.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Final => "final",
            Self::Break => "break",
            Self::All => "all",
        }
    }
}

impl fmt::Display for QuestionMarkStripLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionMarkStripLevel {
    type Err = UnknownStripLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "final" => Ok(Self::Final),
            "break" => Ok(Self::Break),
            "all" => Ok(Self::All),
            other => Err(UnknownStripLevel(other.to_string())),
        }
    }
}

/// Result of [`clean_query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanQuery {
    /// The rewritten query.
    pub query: String,
    /// Cleanups that changed something.
    pub cleanups: BTreeSet<Cleanup>,
}

/// Applies question mark stripping, the Hebrew gershayim fix and tilde
/// header removal, in that order.
///
/// The result is a fixed point: cleaning it again changes nothing.
pub fn clean_query(raw: &str, level: QuestionMarkStripLevel, language: &str) -> CleanQuery {
    let mut cleanups = BTreeSet::new();

    let mut query = strip_question_marks(raw, level);
    if query != raw {
        cleanups.insert(Cleanup::QuestionMarkStripping);
    }

    if language == "he" {
        let fixed = escape_gershayim(&query);
        if fixed != query {
            cleanups.insert(Cleanup::GershayimQuirks);
            query = fixed;
        }
    }

    let without_tilde = query.trim_start_matches('~');
    if without_tilde.len() != query.len() {
        query = without_tilde.to_string();
        cleanups.insert(Cleanup::TildeHeader);
    }

    if !cleanups.is_empty() {
        debug!(?cleanups, cleaned = %query, "query cleaned");
    }
    CleanQuery { query, cleanups }
}

/// Removes question marks according to `level`, then unescapes `\?`.
///
/// Escaped marks stay escaped when unescaping them would expose a `?` that
/// `level` strips. Regex searches (`insource:/`, `intitle:/`) and
/// punctuation-only queries are returned unchanged.
pub fn strip_question_marks(term: &str, level: QuestionMarkStripLevel) -> String {
    if level == QuestionMarkStripLevel::None
        || term.contains("insource:/")
        || term.contains("intitle:/")
        || ONLY_PUNCTUATION.is_match(term)
    {
        return term.to_string();
    }

    let stripped = strip_unescaped_marks(term, level);
    let unescaped = stripped.replace("\\?", "?");
    if strip_unescaped_marks(&unescaped, level) == unescaped {
        unescaped
    } else {
        stripped
    }
}

/// Removes the unescaped question marks `level` targets.
fn strip_unescaped_marks(term: &str, level: QuestionMarkStripLevel) -> String {
    match level {
        QuestionMarkStripLevel::None => term.to_string(),
        QuestionMarkStripLevel::Final => strip_final(term).to_string(),
        QuestionMarkStripLevel::Break => replace_unescaped(term, &BREAKING_MARKS, |caps| {
            caps.get(1).map_or("", |m| m.as_str()).to_string()
        }),
        QuestionMarkStripLevel::All => replace_unescaped(term, &MARKS, |_| " ".to_string()),
    }
}

/// Drops the trailing run of whitespace and unescaped `?`.
fn strip_final(term: &str) -> &str {
    let mut end = term.len();
    while let Some(c) = char_before(term, end) {
        let start = end - c.len_utf8();
        let strip = c.is_whitespace() || (c == '?' && char_before(term, start) != Some('\\'));
        if !strip {
            break;
        }
        end = start;
    }
    &term[..end]
}

/// Replaces matches of `re` that do not start right after a backslash.
fn replace_unescaped(
    text: &str,
    re: &Regex,
    replacement: impl Fn(&regex::Captures<'_>) -> String,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut pos = 0;
    while let Some(caps) = re.captures_at(text, pos) {
        let Some(m) = caps.get(0) else { break };
        if char_before(text, m.start()) == Some('\\') {
            pos = m.start() + 1;
            continue;
        }
        out.push_str(&text[copied..m.start()]);
        out.push_str(&replacement(&caps));
        copied = m.end();
        pos = m.end();
        if m.is_empty() {
            break;
        }
    }
    out.push_str(&text[copied..]);
    out
}

/// Escapes the quote of Hebrew acronyms so it is not read as a phrase.
fn escape_gershayim(query: &str) -> String {
    let mut out = String::with_capacity(query.len() + 2);
    let mut copied = 0;
    let mut pos = 0;
    while let Some(caps) = GERSHAYIM.captures_at(query, pos) {
        let (Some(m), Some(head), Some(tail)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            break;
        };
        let followed_by_letter = query[m.end()..].chars().next().is_some_and(char::is_alphabetic);
        if followed_by_letter {
            pos = m.start() + query[m.start()..].chars().next().map_or(1, char::len_utf8);
            continue;
        }
        out.push_str(&query[copied..m.start()]);
        out.push_str(head.as_str());
        out.push_str("\\\"");
        out.push_str(tail.as_str());
        copied = m.end();
        pos = m.end();
    }
    out.push_str(&query[copied..]);
    out
}
