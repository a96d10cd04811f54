//! Built-in keyword features.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::{Value, json};

use super::{KeywordFeature, KeywordValue, ValueDelimiter, ValueRejected};
use crate::{
    error::WarningCollector,
    namespace::{NS_MAIN, NamespacePrefixParser, NamespaceSelector, RequiredNamespaces},
};

/// Maximum number of `|`-separated values kept by list features.
pub const MAX_LIST_VALUES: usize = 256;

/// `"value"` followed by optional whitespace.
static QUOTED_PREFIX_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^"([^"]*)"\s*$"#).expect("quoted value pattern is valid"));

/// `decay` or `decay,halflife`.
static RECENCY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<decay>\d+(?:\.\d+)?)(?:,(?P<half_life>\d+(?:\.\d+)?))?$")
        .expect("recency pattern is valid")
});

/// Delimiters of regex-capable features.
const REGEX_DELIMITERS: &[ValueDelimiter] = &[
    ValueDelimiter::new('"'),
    ValueDelimiter::new('/').with_suffix("i"),
];

/// A feature defined entirely by its flags; values are not interpreted.
#[derive(Debug, Clone)]
pub struct SimpleKeyword {
    /// Feature name.
    name: &'static str,
    /// Accepted prefixes.
    prefixes: Vec<&'static str>,
    /// See [`KeywordFeature::has_value`].
    has_value: bool,
    /// See [`KeywordFeature::greedy`].
    greedy: bool,
    /// See [`KeywordFeature::query_header`].
    query_header: bool,
    /// See [`KeywordFeature::allow_empty_value`].
    allow_empty_value: bool,
}

impl SimpleKeyword {
    /// Creates a plain valued feature.
    pub fn new(name: &'static str, prefixes: &[&'static str]) -> Self {
        Self {
            name,
            prefixes: prefixes.to_vec(),
            has_value: true,
            greedy: false,
            query_header: false,
            allow_empty_value: false,
        }
    }

    /// Sets whether a value follows the colon.
    pub const fn with_value(mut self, has_value: bool) -> Self {
        self.has_value = has_value;
        self
    }

    /// Sets whether the value extends to the end of the query.
    pub const fn with_greedy(mut self, greedy: bool) -> Self {
        self.greedy = greedy;
        self
    }

    /// Sets whether the feature is a query header.
    pub const fn with_query_header(mut self, query_header: bool) -> Self {
        self.query_header = query_header;
        self
    }

    /// Sets whether `key:` may stand alone.
    pub const fn with_empty_value(mut self, allow: bool) -> Self {
        self.allow_empty_value = allow;
        self
    }
}

impl KeywordFeature for SimpleKeyword {
    fn name(&self) -> &str {
        self.name
    }

    fn prefixes(&self) -> &[&'static str] {
        &self.prefixes
    }

    fn has_value(&self) -> bool {
        self.has_value
    }

    fn greedy(&self) -> bool {
        self.greedy
    }

    fn query_header(&self) -> bool {
        self.query_header
    }

    fn allow_empty_value(&self) -> bool {
        self.allow_empty_value
    }
}

/// `intitle:` and `insource:`, accepting `"text"` or `/regex/i` values.
#[derive(Debug, Clone)]
pub struct RegexFeature {
    /// Feature name, also the prefix.
    name: &'static str,
    /// Accepted prefixes.
    prefixes: [&'static str; 1],
    /// Whether regex search is available.
    regex_enabled: bool,
}

impl RegexFeature {
    /// The `intitle:` feature.
    pub const fn intitle(regex_enabled: bool) -> Self {
        Self {
            name: "intitle",
            prefixes: ["intitle"],
            regex_enabled,
        }
    }

    /// The `insource:` feature.
    pub const fn insource(regex_enabled: bool) -> Self {
        Self {
            name: "insource",
            prefixes: ["insource"],
            regex_enabled,
        }
    }
}

impl KeywordFeature for RegexFeature {
    fn name(&self) -> &str {
        self.name
    }

    fn prefixes(&self) -> &[&'static str] {
        &self.prefixes
    }

    fn value_delimiters(&self) -> &[ValueDelimiter] {
        REGEX_DELIMITERS
    }

    fn parse_value(
        &self,
        value: &KeywordValue<'_>,
        warnings: &mut dyn WarningCollector,
    ) -> Result<Option<Value>, ValueRejected> {
        if value.delimiter != Some('/') {
            return Ok(None);
        }
        if !self.regex_enabled {
            warnings.add_warning("feature-not-available", &[&format!("{} regex", value.key)]);
        }
        let pattern = value
            .quoted
            .strip_prefix('/')
            .and_then(|rest| rest.strip_suffix('/'))
            .unwrap_or(value.quoted);
        Ok(Some(json!({
            "type": "regex",
            "pattern": pattern,
            "insensitive": value.suffix == "i",
        })))
    }
}

/// `|`-separated value lists such as `incategory:` and `articletopic:`.
///
/// Their values do not count against the query length limit.
#[derive(Debug, Clone)]
pub struct ListFeature {
    /// Feature name, also the prefix.
    name: &'static str,
    /// Accepted prefixes.
    prefixes: [&'static str; 1],
}

impl ListFeature {
    /// The `incategory:` feature.
    pub const fn incategory() -> Self {
        Self {
            name: "incategory",
            prefixes: ["incategory"],
        }
    }

    /// The `articletopic:` feature.
    pub const fn articletopic() -> Self {
        Self {
            name: "articletopic",
            prefixes: ["articletopic"],
        }
    }
}

impl KeywordFeature for ListFeature {
    fn name(&self) -> &str {
        self.name
    }

    fn prefixes(&self) -> &[&'static str] {
        &self.prefixes
    }

    fn parse_value(
        &self,
        value: &KeywordValue<'_>,
        warnings: &mut dyn WarningCollector,
    ) -> Result<Option<Value>, ValueRejected> {
        let mut values: Vec<&str> = value
            .value
            .split('|')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect();
        if values.len() > MAX_LIST_VALUES {
            warnings.add_warning(
                "feature-too-many-conditions",
                &[value.key, &MAX_LIST_VALUES.to_string()],
            );
            values.truncate(MAX_LIST_VALUES);
        }
        Ok(Some(json!({ "values": values })))
    }
}

/// `prefix:`, a greedy title prefix that may name a namespace.
#[derive(Debug, Clone)]
pub struct PrefixFeature {
    /// Resolves `help:` style prefixes inside the value.
    namespaces: Arc<dyn NamespacePrefixParser>,
}

impl PrefixFeature {
    /// Creates the feature with a namespace resolver.
    pub fn new(namespaces: Arc<dyn NamespacePrefixParser>) -> Self {
        Self { namespaces }
    }
}

impl KeywordFeature for PrefixFeature {
    fn name(&self) -> &str {
        "prefix"
    }

    fn prefixes(&self) -> &[&'static str] {
        &["prefix"]
    }

    fn greedy(&self) -> bool {
        true
    }

    fn parse_value(
        &self,
        value: &KeywordValue<'_>,
        _warnings: &mut dyn WarningCollector,
    ) -> Result<Option<Value>, ValueRejected> {
        let mut text = value.value;
        let mut namespace = Some(NS_MAIN);
        if let Some((rest, selector)) = self.namespaces.parse(text) {
            text = rest;
            namespace = match selector {
                NamespaceSelector::Id(id) => Some(id),
                NamespaceSelector::All => None,
            };
            if let Some(caps) = QUOTED_PREFIX_VALUE.captures(text) {
                text = caps.get(1).map_or("", |m| m.as_str());
            }
        }

        let text = text.trim();
        let text = if text.is_empty() {
            Value::Null
        } else {
            Value::from(text)
        };

        Ok(Some(match namespace {
            Some(id) => json!({
                "namespace": id,
                "value": text,
                "parsed_namespaces": [id],
            }),
            None => json!({
                "value": text,
                "parsed_namespaces": "all",
            }),
        }))
    }

    fn required_namespaces(&self, parsed: Option<&Value>) -> Option<RequiredNamespaces> {
        match parsed?.get("parsed_namespaces")? {
            Value::String(all) if all == "all" => Some(RequiredNamespaces::All),
            Value::Array(ids) => Some(RequiredNamespaces::Ids(
                ids.iter()
                    .filter_map(Value::as_i64)
                    .filter_map(|id| i32::try_from(id).ok())
                    .collect(),
            )),
            _ => None,
        }
    }
}

/// `prefer-recent:`, boosting recently edited pages.
///
/// Accepts `prefer-recent:`, `prefer-recent:decay` and
/// `prefer-recent:decay,halflife`; any other value is rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreferRecentFeature {
    /// Decay used when none is given.
    pub default_decay: f64,
    /// Half life in days used when none is given.
    pub default_half_life: f64,
}

impl Default for PreferRecentFeature {
    fn default() -> Self {
        Self {
            default_decay: 0.6,
            default_half_life: 160.0,
        }
    }
}

impl KeywordFeature for PreferRecentFeature {
    fn name(&self) -> &str {
        "prefer-recent"
    }

    fn prefixes(&self) -> &[&'static str] {
        &["prefer-recent"]
    }

    fn allow_empty_value(&self) -> bool {
        true
    }

    fn parse_value(
        &self,
        value: &KeywordValue<'_>,
        _warnings: &mut dyn WarningCollector,
    ) -> Result<Option<Value>, ValueRejected> {
        let caps = RECENCY.captures(value.value).ok_or(ValueRejected)?;
        let number = |name: &str, default: f64| {
            caps.name(name)
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .unwrap_or(default)
        };
        Ok(Some(json!({
            "decay": number("decay", self.default_decay),
            "half_life": number("half_life", self.default_half_life),
        })))
    }
}

/// `local:`, restricting the search to the local wiki.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFeature;

impl KeywordFeature for LocalFeature {
    fn name(&self) -> &str {
        "local"
    }

    fn prefixes(&self) -> &[&'static str] {
        &["local"]
    }

    fn has_value(&self) -> bool {
        false
    }

    fn query_header(&self) -> bool {
        true
    }
}

/// `morelike:`, finding pages similar to the `|`-separated titles that
/// follow.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoreLikeFeature;

impl KeywordFeature for MoreLikeFeature {
    fn name(&self) -> &str {
        "morelike"
    }

    fn prefixes(&self) -> &[&'static str] {
        &["morelike"]
    }

    fn greedy(&self) -> bool {
        true
    }

    fn query_header(&self) -> bool {
        true
    }

    fn parse_value(
        &self,
        value: &KeywordValue<'_>,
        _warnings: &mut dyn WarningCollector,
    ) -> Result<Option<Value>, ValueRejected> {
        let titles: Vec<&str> = value
            .value
            .split('|')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();
        Ok(Some(json!({ "titles": titles })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{ParseWarning, PositionedWarnings},
        namespace::StaticNamespaces,
    };

    fn value<'a>(key: &'a str, raw: &'a str) -> KeywordValue<'a> {
        KeywordValue {
            key,
            value: raw,
            quoted: raw,
            delimiter: None,
            suffix: "",
        }
    }

    fn parse(
        feature: &dyn KeywordFeature,
        value: &KeywordValue<'_>,
    ) -> (Result<Option<Value>, ValueRejected>, Vec<ParseWarning>) {
        let mut warnings = Vec::new();
        let result = feature.parse_value(value, &mut PositionedWarnings::new(0, &mut warnings));
        (result, warnings)
    }

    #[test]
    fn regex_value() {
        let value = KeywordValue {
            key: "insource",
            value: r#"test/""#,
            quoted: r#"/test\/"/"#,
            delimiter: Some('/'),
            suffix: "i",
        };
        let (parsed, warnings) = parse(&RegexFeature::insource(true), &value);
        assert_eq!(
            parsed.unwrap(),
            Some(json!({"type": "regex", "pattern": r#"test\/""#, "insensitive": true}))
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn regex_keeps_escaped_trailing_slash() {
        let value = KeywordValue {
            key: "insource",
            value: "a/",
            quoted: r"/a\//",
            delimiter: Some('/'),
            suffix: "",
        };
        let (parsed, _) = parse(&RegexFeature::insource(true), &value);
        let parsed = parsed.unwrap().unwrap();
        assert_eq!(parsed["pattern"], r"a\/");
        assert_eq!(parsed["insensitive"], false);
    }

    #[test]
    fn regex_disabled_warns() {
        let value = KeywordValue {
            key: "intitle",
            value: "a.b",
            quoted: "/a.b/",
            delimiter: Some('/'),
            suffix: "",
        };
        let (parsed, warnings) = parse(&RegexFeature::intitle(false), &value);
        assert!(parsed.unwrap().is_some());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].message, "feature-not-available");
        assert_eq!(warnings[0].params, vec!["intitle regex"]);
    }

    #[test]
    fn quoted_title_not_interpreted() {
        let (parsed, _) = parse(&RegexFeature::intitle(true), &value("intitle", "foo"));
        assert_eq!(parsed.unwrap(), None);
    }

    #[test]
    fn list_values() {
        let (parsed, _) = parse(&ListFeature::incategory(), &value("incategory", "A|B| |C"));
        assert_eq!(parsed.unwrap(), Some(json!({"values": ["A", "B", "C"]})));
    }

    #[test]
    fn list_too_long_truncated() {
        let raw = vec!["x"; MAX_LIST_VALUES + 5].join("|");
        let (parsed, warnings) = parse(&ListFeature::articletopic(), &value("articletopic", &raw));
        let parsed = parsed.unwrap().unwrap();
        assert_eq!(parsed["values"].as_array().map(Vec::len), Some(MAX_LIST_VALUES));
        assert_eq!(warnings[0].message, "feature-too-many-conditions");
    }

    #[test]
    fn prefix_in_main_namespace() {
        let feature = PrefixFeature::new(Arc::new(StaticNamespaces::wiki_defaults()));
        let (parsed, _) = parse(&feature, &value("prefix", "Foo bar "));
        let parsed = parsed.unwrap();
        assert_eq!(
            parsed,
            Some(json!({"namespace": 0, "value": "Foo bar", "parsed_namespaces": [0]}))
        );
        assert_eq!(
            feature.required_namespaces(parsed.as_ref()),
            Some(RequiredNamespaces::Ids([0].into()))
        );
    }

    #[test]
    fn prefix_with_namespace() {
        let feature = PrefixFeature::new(Arc::new(StaticNamespaces::wiki_defaults()));
        let (parsed, _) = parse(&feature, &value("prefix", "help:\"Foo\" "));
        assert_eq!(
            parsed.unwrap(),
            Some(json!({"namespace": 12, "value": "Foo", "parsed_namespaces": [12]}))
        );
    }

    #[test]
    fn prefix_all_namespaces() {
        let feature = PrefixFeature::new(Arc::new(StaticNamespaces::wiki_defaults()));
        let (parsed, _) = parse(&feature, &value("prefix", "all:"));
        let parsed = parsed.unwrap();
        assert_eq!(
            parsed,
            Some(json!({"value": null, "parsed_namespaces": "all"}))
        );
        assert_eq!(
            feature.required_namespaces(parsed.as_ref()),
            Some(RequiredNamespaces::All)
        );
    }

    #[test]
    fn prefer_recent_values() {
        let feature = PreferRecentFeature::default();
        let (parsed, _) = parse(&feature, &value("prefer-recent", "0.8"));
        assert_eq!(
            parsed.unwrap(),
            Some(json!({"decay": 0.8, "half_life": 160.0}))
        );

        let (parsed, _) = parse(&feature, &value("prefer-recent", "1,7"));
        assert_eq!(parsed.unwrap(), Some(json!({"decay": 1.0, "half_life": 7.0})));
    }

    #[test]
    fn prefer_recent_rejects_garbage() {
        let feature = PreferRecentFeature::default();
        let (parsed, _) = parse(&feature, &value("prefer-recent", "intitle:test"));
        assert_eq!(parsed, Err(ValueRejected));
    }

    #[test]
    fn morelike_titles() {
        let (parsed, _) = parse(&MoreLikeFeature, &value("morelike", "Foo|Bar baz "));
        assert_eq!(parsed.unwrap(), Some(json!({"titles": ["Foo", "Bar baz"]})));
    }
}
