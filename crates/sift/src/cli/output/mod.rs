//! Rendering and JSON serialization for CLI output.

use std::fmt;

use comfy_table::{Cell, Table, presets::UTF8_FULL_CONDENSED};
use serde::Serialize;
use sift_query::{ParsedQuery, RequiredNamespaces};

/// ANSI escape codes.
mod colors {
    /// Bold text.
    pub const BOLD: &str = "\x1b[1m";
    /// Cyan foreground.
    pub const CYAN: &str = "\x1b[36m";
    /// Yellow foreground.
    pub const YELLOW: &str = "\x1b[33m";
    /// Dimmed text.
    pub const DIM: &str = "\x1b[2m";
    /// Reset all formatting.
    pub const RESET: &str = "\x1b[0m";
}

/// Formats a header with bold cyan styling.
pub fn header(text: &str) -> String {
    format!("{}{}{}{}", colors::BOLD, colors::CYAN, text, colors::RESET)
}

/// Formats text as a subheader (bold).
pub fn subheader(text: &str) -> String {
    format!("{}{}{}", colors::BOLD, text, colors::RESET)
}

/// Formats text as dimmed/less important.
pub fn dim(text: &str) -> String {
    format!("{}{}{}", colors::DIM, text, colors::RESET)
}

/// Formats text as a warning (yellow).
pub fn warning(text: &str) -> String {
    format!("{}{}{}", colors::YELLOW, text, colors::RESET)
}

/// Indents every non-empty line by two spaces.
pub fn indent_content(content: &str) -> String {
    content
        .lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("  {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// JSON output for a single parsed query.
#[derive(Serialize)]
struct JsonParsedQuery<'a> {
    /// The parse result.
    #[serde(flatten)]
    parsed: &'a ParsedQuery,
    /// Keyword features used.
    features: Vec<&'a str>,
    /// Query classes assigned by the classifiers.
    classes: Vec<&'static str>,
    /// Namespaces the search would run in, when requested namespaces were given.
    #[serde(skip_serializing_if = "Option::is_none")]
    namespaces: Option<Vec<i32>>,
}

/// JSON output for `sift parse`.
#[derive(Serialize)]
struct JsonParseOutput<'a> {
    /// Results in argument order.
    queries: Vec<JsonParsedQuery<'a>>,
}

/// Serializes parse results as pretty JSON.
pub fn parse_results_json(
    results: &[ParsedQuery],
    requested: Option<&[i32]>,
) -> serde_json::Result<String> {
    let output = JsonParseOutput {
        queries: results
            .iter()
            .map(|parsed| JsonParsedQuery {
                parsed,
                features: parsed.features_used(),
                classes: parsed.query_classes(),
                namespaces: requested.map(|ids| parsed.actual_namespaces(Some(ids), None)),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&output)
}

/// Joins displayable items with `, `, or returns a dimmed placeholder.
fn list_or_none<T: ToString>(items: impl IntoIterator<Item = T>) -> String {
    let items: Vec<String> = items.into_iter().map(|item| item.to_string()).collect();
    if items.is_empty() {
        dim("(none)")
    } else {
        items.join(", ")
    }
}

/// Human-readable rendering of a parse result.
pub struct ParsedView<'a> {
    /// The parse result.
    pub parsed: &'a ParsedQuery,
    /// Namespaces the search was requested in, if given.
    pub requested: Option<&'a [i32]>,
}

impl fmt::Display for ParsedView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parsed = self.parsed;
        writeln!(f, "{} {:?}", header("Query"), parsed.raw_query())?;
        if parsed.query() != parsed.raw_query() {
            writeln!(f, "  cleaned: {:?}", parsed.query())?;
        }
        if !parsed.cleanups().is_empty() {
            writeln!(f, "  cleanups: {}", list_or_none(parsed.cleanups()))?;
        }
        if let Some(namespace) = parsed.header_namespace() {
            writeln!(f, "  namespace header: {namespace}")?;
        }
        match parsed.required_namespaces() {
            RequiredNamespaces::All => writeln!(f, "  required namespaces: all")?,
            RequiredNamespaces::Ids(ids) if !ids.is_empty() => {
                writeln!(f, "  required namespaces: {}", list_or_none(ids))?;
            }
            RequiredNamespaces::Ids(_) => {}
        }
        if let Some(ids) = self.requested {
            let namespaces = parsed.actual_namespaces(Some(ids), None);
            writeln!(f, "  namespaces: {}", list_or_none(namespaces))?;
        }
        writeln!(f, "  features: {}", list_or_none(parsed.features_used()))?;
        writeln!(f, "  classes: {}", list_or_none(parsed.query_classes()))?;

        writeln!(f)?;
        writeln!(f, "{}", subheader("Tree"))?;
        writeln!(f, "{}", indent_content(&parsed.root().to_string()))?;

        if !parsed.warnings().is_empty() {
            writeln!(f)?;
            let title = format!("Warnings ({})", parsed.warnings().len());
            writeln!(f, "{}", subheader(&title))?;
            for parse_warning in parsed.warnings() {
                writeln!(f, "  - {}", warning(&parse_warning.to_string()))?;
            }
        }
        Ok(())
    }
}

/// Builds a table of the keywords matched in a parse result.
///
/// Returns `None` when the query uses no keywords.
pub fn keyword_table(parsed: &ParsedQuery) -> Option<Table> {
    let mut rows = Vec::new();
    parsed.root().visit_keywords(&mut |keyword| {
        let parsed_value = keyword
            .parsed_value
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        rows.push(vec![
            Cell::new(&keyword.feature),
            Cell::new(&keyword.key),
            Cell::new(&keyword.value),
            Cell::new(keyword.span.to_string()),
            Cell::new(parsed_value),
        ]);
    });
    if rows.is_empty() {
        return None;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["Feature", "Key", "Value", "Span", "Parsed"]);
    for row in rows {
        table.add_row(row);
    }
    Some(table)
}

#[cfg(test)]
mod tests {
    use sift_query::parse;

    use super::*;

    #[test]
    fn indent_content_skips_blank_lines() {
        assert_eq!(indent_content("a\n\nb\n"), "  a\n\n  b");
    }

    #[test]
    fn render_simple_query() {
        let parsed = parse("hello world").unwrap();
        let rendered = ParsedView { parsed: &parsed, requested: None }.to_string();
        assert!(rendered.contains("\"hello world\""));
        assert!(rendered.contains("classes: simple_bag_of_words"));
        assert!(rendered.contains("Words(\"hello world\") [0, 11)"));
        assert!(!rendered.contains("cleaned:"));
        assert!(!rendered.contains("Warnings"));
    }

    #[test]
    fn render_cleaned_query_with_header() {
        let parsed = parse("help:why?").unwrap();
        let rendered = ParsedView {
            parsed: &parsed,
            requested: Some(&[0]),
        }
        .to_string();
        assert!(rendered.contains("cleaned: \"help:why\""));
        assert!(rendered.contains("cleanups: question_mark_stripping"));
        assert!(rendered.contains("namespace header: 12"));
        assert!(rendered.contains("namespaces: 12"));
    }

    #[test]
    fn render_warnings() {
        let parsed = parse("\"open").unwrap();
        let rendered = ParsedView { parsed: &parsed, requested: None }.to_string();
        assert!(rendered.contains("Warnings (1)"));
        assert!(rendered.contains("parse-error-unbalanced-phrase"));
    }

    #[test]
    fn keyword_rows() {
        let parsed = parse("intitle:foo incategory:\"Living people\" bar").unwrap();
        let table = keyword_table(&parsed).unwrap().to_string();
        assert!(table.contains("intitle"));
        assert!(table.contains("Living people"));
        assert!(keyword_table(&parse("no keywords").unwrap()).is_none());
    }

    #[test]
    fn json_output() {
        let results = vec![parse("intitle:foo bar").unwrap()];
        let json = parse_results_json(&results, Some(&[0])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let query = &value["queries"][0];
        assert_eq!(query["raw_query"], "intitle:foo bar");
        assert_eq!(query["features"][0], "intitle");
        assert_eq!(query["classes"][0], "complex_query");
        assert_eq!(query["namespaces"][0], 0);
        assert_eq!(query["root"]["type"], "boolean");
    }
}
