//! Keyword scanning.
//!
//! Each feature is scanned over the whole query with its own pattern. A
//! normal keyword must start the query, start where the scan (or the
//! previous match) stopped, or follow a blank character. Header keywords are
//! matched back to back from the scan start, skipping blanks.

use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::{
    ast::{KeywordNode, Negation, Node, Span},
    error::{ParseWarning, PositionedWarnings},
    keywords::{KeywordFeature, KeywordValue},
    span::SpanTracker,
    text::ends_with_blank,
};

/// Compiled pattern for one keyword feature.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    /// `key:value` pattern with named groups.
    regex: Regex,
    /// Whether matches must follow each other from the scan start.
    header: bool,
    /// Delimiters in pattern group order.
    delimiters: Vec<char>,
}

/// Offsets and text of one accepted pattern match.
#[derive(Debug)]
struct RawMatch<'q> {
    /// Start of the key, negation included.
    start: usize,
    /// End of the whole match.
    end: usize,
    /// Key as matched, negation included.
    key: &'q str,
    /// Parsed value, if the feature has one.
    value: Option<RawValue<'q>>,
}

/// Value part of a match.
#[derive(Debug)]
struct RawValue<'q> {
    /// Offset right after the colon.
    start: usize,
    /// Matched value text, delimiters and suffix included.
    whole: &'q str,
    /// Value text without delimiters, escapes kept.
    inner: &'q str,
    /// Delimiter, if quoted.
    delimiter: Option<char>,
    /// Matched suffix, or empty.
    suffix: &'q str,
}

impl KeywordMatcher {
    /// Builds the matcher for `feature`.
    pub fn new(feature: &dyn KeywordFeature) -> Result<Self, regex::Error> {
        let prefixes = feature
            .prefixes()
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");
        let header = feature.query_header();
        let mut delimiters = Vec::new();

        let value = if !feature.has_value() {
            String::new()
        } else if feature.greedy() {
            "(?P<value>(?P<unquoted>.+))".to_string()
        } else {
            let mut alternatives = Vec::new();
            for (i, config) in feature.value_delimiters().iter().enumerate() {
                let delim = regex::escape(&config.delimiter.to_string());
                let suffix = config
                    .suffix
                    .map(|s| format!("(?P<s{i}>{})?", regex::escape(s)))
                    .unwrap_or_default();
                alternatives.push(format!(
                    r"(?P<d{i}>{delim})(?P<q{i}>(?:\\{delim}|[^{delim}\n])*){delim}{suffix}"
                ));
                delimiters.push(config.delimiter);
            }
            let quantifier = if feature.allow_empty_value() { '*' } else { '+' };
            alternatives.push(format!(r#"(?P<unquoted>[^"\s\x00-\x1f]{quantifier})"#));
            format!("(?P<value>{})", alternatives.join("|"))
        };

        let lead = if header { r"[\p{Z}\p{C}]*" } else { "" };
        let regex = Regex::new(&format!("{lead}(?P<key>-?(?:{prefixes})):{value}"))?;
        Ok(Self {
            regex,
            header,
            delimiters,
        })
    }

    /// Scans `query` for occurrences of `feature`, starting at the first
    /// offset at or after `from` not claimed in `tracker`.
    ///
    /// Warnings raised while parsing values are appended to `warnings`.
    pub fn scan(
        &self,
        query: &str,
        feature: &dyn KeywordFeature,
        tracker: &SpanTracker,
        from: usize,
        warnings: &mut Vec<ParseWarning>,
    ) -> Vec<Node> {
        let mut nodes = Vec::new();
        let mut pos = tracker.minimal_unconsumed_offset(from);
        let mut anchor = pos;

        while let Some(raw) = self.next_match(query, pos, anchor) {
            pos = raw.end;
            anchor = raw.end;
            if let Some(node) = build_node(query, feature, tracker, raw, warnings) {
                nodes.push(node);
            }
        }
        nodes
    }

    /// Finds the next acceptable match at or after `pos`.
    fn next_match<'q>(&self, query: &'q str, mut pos: usize, anchor: usize) -> Option<RawMatch<'q>> {
        while pos <= query.len() {
            let caps = self.regex.captures_at(query, pos)?;
            let whole = caps.get(0)?;
            let key = caps.name("key")?;

            if self.header {
                return (whole.start() == pos).then(|| self.raw_match(&caps, key));
            }

            let start = key.start();
            let bounded =
                start == 0 || start == anchor || ends_with_blank(&query[..start]);
            if bounded {
                return Some(self.raw_match(&caps, key));
            }
            pos = start + query[start..].chars().next().map_or(1, char::len_utf8);
        }
        None
    }

    /// Extracts offsets and text from a pattern match.
    fn raw_match<'q>(&self, caps: &Captures<'q>, key: regex::Match<'q>) -> RawMatch<'q> {
        let end = caps.get(0).map_or(key.end(), |m| m.end());
        let value = caps.name("value").map(|whole| {
            let start = key.end() + 1;
            if let Some(unquoted) = caps.name("unquoted") {
                return RawValue {
                    start,
                    whole: whole.as_str(),
                    inner: unquoted.as_str(),
                    delimiter: None,
                    suffix: "",
                };
            }
            let quoted = self
                .delimiters
                .iter()
                .enumerate()
                .find_map(|(i, d)| caps.name(&format!("q{i}")).map(|q| (i, *d, q)));
            match quoted {
                Some((i, delimiter, inner)) => RawValue {
                    start,
                    whole: whole.as_str(),
                    inner: inner.as_str(),
                    delimiter: Some(delimiter),
                    suffix: caps.name(&format!("s{i}")).map_or("", |m| m.as_str()),
                },
                None => RawValue {
                    start,
                    whole: whole.as_str(),
                    inner: whole.as_str(),
                    delimiter: None,
                    suffix: "",
                },
            }
        });
        RawMatch {
            start: key.start(),
            end,
            key: key.as_str(),
            value,
        }
    }
}

/// Turns a match into a node, or `None` if the match must be skipped.
fn build_node(
    query: &str,
    feature: &dyn KeywordFeature,
    tracker: &SpanTracker,
    raw: RawMatch<'_>,
    warnings: &mut Vec<ParseWarning>,
) -> Option<Node> {
    let (negation, key) = match raw.key.strip_prefix('-') {
        Some(key) => (Some(Negation::Dash), key),
        None => (None, raw.key),
    };
    let key_start = raw.start + usize::from(negation.is_some());
    let mut end = raw.end;

    let mut value = String::new();
    let mut quoted_value = String::new();
    let mut delimiter = None;
    let mut suffix = String::new();
    let mut parsed_value = None;

    if let Some(raw_value) = raw.value {
        let (unquoted, quoted) = match raw_value.delimiter {
            Some(d) => (
                raw_value.inner.replace(&format!("\\{d}"), &d.to_string()),
                &raw_value.whole[..raw_value.whole.len() - raw_value.suffix.len()],
            ),
            None => (raw_value.inner.to_string(), raw_value.whole),
        };

        let mut accepted = true;
        if !raw_value.whole.is_empty() {
            let candidate = KeywordValue {
                key,
                value: &unquoted,
                quoted,
                delimiter: raw_value.delimiter,
                suffix: raw_value.suffix,
            };
            let mut sink = PositionedWarnings::new(raw_value.start, warnings);
            match feature.parse_value(&candidate, &mut sink) {
                Ok(parsed) => parsed_value = parsed,
                Err(_) if feature.allow_empty_value() => {
                    debug!(feature = feature.name(), value = quoted, "value rejected, keeping bare key");
                    accepted = false;
                    end = raw_value.start;
                }
                Err(_) => {
                    warn!(
                        feature = feature.name(),
                        value = quoted,
                        "feature rejected a value without allowing empty values, skipping match"
                    );
                    return None;
                }
            }
        }

        if accepted {
            value = unquoted;
            quoted_value = quoted.to_string();
            delimiter = raw_value.delimiter;
            suffix = raw_value.suffix.to_string();
        }
    }

    if tracker.overlap(raw.start, end) {
        debug!(
            feature = feature.name(),
            start = raw.start,
            end,
            "keyword overlaps a claimed span, skipping"
        );
        return None;
    }

    debug!(feature = feature.name(), start = raw.start, end, text = &query[raw.start..end], "keyword matched");
    let node = Node::Keyword(KeywordNode {
        span: Span::new(key_start, end),
        feature: feature.name().to_string(),
        key: key.to_string(),
        value,
        quoted_value,
        delimiter,
        suffix,
        parsed_value,
    });
    Some(match negation {
        Some(negation) => Node::negated(Span::new(raw.start, end), node, negation),
        None => node,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::{
        keywords::{
            KeywordRegistry, LocalFeature, MoreLikeFeature, PreferRecentFeature, PrefixFeature,
            RegexFeature, SimpleKeyword,
        },
        namespace::StaticNamespaces,
    };

    /// Scans every feature of `registry` in scan order, like the parser does.
    fn scan_all(registry: &KeywordRegistry, query: &str) -> (Vec<Node>, Vec<ParseWarning>) {
        let mut tracker = SpanTracker::new();
        let mut warnings = Vec::new();
        let mut all = Vec::new();
        for registered in registry.scan_order() {
            let nodes =
                registered
                    .matcher()
                    .scan(query, registered.feature(), &tracker, 0, &mut warnings);
            tracker.append_nodes(&nodes);
            all.extend(nodes);
        }
        all.sort_by_key(Node::span);
        (all, warnings)
    }

    fn scan_one(feature: impl KeywordFeature + 'static, query: &str) -> Vec<Node> {
        let registry = KeywordRegistry::new().with(feature).unwrap();
        scan_all(&registry, query).0
    }

    fn keyword(node: &Node) -> &KeywordNode {
        node.as_keyword().expect("keyword node")
    }

    #[test]
    fn simple_value() {
        let nodes = scan_one(RegexFeature::intitle(true), "intitle:test");
        assert_eq!(nodes.len(), 1);
        let kw = keyword(&nodes[0]);
        assert_eq!(kw.span, Span::new(0, 12));
        assert_eq!(kw.key, "intitle");
        assert_eq!(kw.value, "test");
        assert_eq!(kw.quoted_value, "test");
        assert_eq!(kw.delimiter, None);
    }

    #[test]
    fn negated_quoted_value_with_escape() {
        let query = r#"foo bar baz qux quux -intitle:"hop\"foo""#;
        let nodes = scan_one(RegexFeature::intitle(true), query);
        assert_eq!(nodes.len(), 1);
        let Node::Negated { span, inner, .. } = &nodes[0] else {
            panic!("expected negated node");
        };
        assert_eq!(*span, Span::new(21, 40));
        let kw = keyword(inner);
        assert_eq!(kw.span, Span::new(22, 40));
        assert_eq!(kw.value, r#"hop"foo"#);
        assert_eq!(kw.quoted_value, r#""hop\"foo""#);
        assert_eq!(kw.delimiter, Some('"'));
    }

    #[test]
    fn regex_value_with_suffix() {
        let query = r#"intitle:x insource:/test\/"/i"#;
        let nodes = scan_one(RegexFeature::insource(true), query);
        let kw = keyword(&nodes[0]);
        assert_eq!(kw.span, Span::new(10, 29));
        assert_eq!(kw.delimiter, Some('/'));
        assert_eq!(kw.suffix, "i");
        assert_eq!(kw.value, r#"test/""#);
        assert_eq!(kw.quoted_value, r#"/test\/"/"#);
        assert_eq!(
            kw.parsed_value,
            Some(json!({"type": "regex", "pattern": r#"test\/""#, "insensitive": true}))
        );
    }

    #[test]
    fn suffix_only_after_its_delimiter() {
        let nodes = scan_one(RegexFeature::insource(true), r#"insource:"foo"i"#);
        let kw = keyword(&nodes[0]);
        assert_eq!(kw.span, Span::new(0, 14));
        assert_eq!(kw.suffix, "");
    }

    #[test]
    fn needs_boundary_before_key() {
        assert!(scan_one(RegexFeature::intitle(true), "xintitle:foo").is_empty());
        assert!(scan_one(RegexFeature::intitle(true), "a-intitle:foo").is_empty());
        assert_eq!(scan_one(RegexFeature::intitle(true), "a intitle:foo").len(), 1);
    }

    #[test]
    fn space_after_colon_is_not_a_value() {
        assert!(scan_one(RegexFeature::intitle(true), "intitle: foo").is_empty());
    }

    #[test]
    fn several_occurrences() {
        let nodes = scan_one(
            SimpleKeyword::new("hastemplate", &["hastemplate"]),
            "hastemplate:a foo hastemplate:\"b c\"",
        );
        let values: Vec<&str> = nodes.iter().map(|n| keyword(n).value.as_str()).collect();
        assert_eq!(values, vec!["a", "b c"]);
    }

    #[test]
    fn greedy_takes_rest() {
        let nodes = scan_one(MoreLikeFeature, "morelike:Foo|Bar baz ");
        let kw = keyword(&nodes[0]);
        assert_eq!(kw.span, Span::new(0, 21));
        assert_eq!(kw.value, "Foo|Bar baz ");
    }

    #[test]
    fn greedy_prefix_value() {
        let feature = PrefixFeature::new(Arc::new(StaticNamespaces::wiki_defaults()));
        let nodes = scan_one(feature, "foo prefix:help:Bar ");
        let kw = keyword(&nodes[0]);
        assert_eq!(kw.span, Span::new(4, 20));
        assert_eq!(kw.value, "help:Bar ");
        assert_eq!(kw.parsed_value.as_ref().unwrap()["namespace"], 12);
    }

    #[test]
    fn headers_chain_from_start() {
        let nodes = scan_one(LocalFeature, " local:local: foo local:");
        let spans: Vec<Span> = nodes.iter().map(Node::span).collect();
        assert_eq!(spans, vec![Span::new(1, 7), Span::new(7, 13)]);
    }

    #[test]
    fn header_not_at_start_ignored() {
        assert!(scan_one(LocalFeature, "foo local:").is_empty());
    }

    #[test]
    fn empty_value_allowed() {
        let nodes = scan_one(PreferRecentFeature::default(), "prefer-recent: foo");
        let kw = keyword(&nodes[0]);
        assert_eq!(kw.span, Span::new(0, 14));
        assert_eq!(kw.value, "");
        assert_eq!(kw.parsed_value, None);
    }

    #[test]
    fn rejected_value_shrinks_match() {
        let registry = KeywordRegistry::new()
            .with(PreferRecentFeature::default())
            .unwrap()
            .with(RegexFeature::intitle(true))
            .unwrap();
        let (nodes, _) = scan_all(&registry, "prefer-recent:intitle:test");
        let spans: Vec<Span> = nodes.iter().map(Node::span).collect();
        assert_eq!(spans, vec![Span::new(0, 14), Span::new(14, 26)]);
        assert_eq!(keyword(&nodes[0]).value, "");
        assert_eq!(keyword(&nodes[1]).value, "test");
    }

    #[test]
    fn overlapping_match_skipped() {
        let registry = KeywordRegistry::new()
            .with(MoreLikeFeature)
            .unwrap()
            .with(RegexFeature::intitle(true))
            .unwrap();
        let (nodes, _) = scan_all(&registry, "morelike:x intitle:y");
        assert_eq!(nodes.len(), 1);
        assert_eq!(keyword(&nodes[0]).feature, "morelike");
    }

    #[test]
    fn value_warnings_positioned_at_value() {
        let registry = KeywordRegistry::new()
            .with(RegexFeature::intitle(false))
            .unwrap();
        let (_, warnings) = scan_all(&registry, "foo intitle:/bar/");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].position, Some(12));
    }

    #[test]
    fn multiple_prefixes() {
        let nodes = scan_one(
            SimpleKeyword::new("linksto", &["linksto", "links"]),
            "links:Foo linksto:Bar",
        );
        let keys: Vec<&str> = nodes.iter().map(|n| keyword(n).key.as_str()).collect();
        assert_eq!(keys, vec!["links", "linksto"]);
    }
}
