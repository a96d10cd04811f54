//! Namespace selection.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use serde::Serialize;

/// Namespace selected by a query prefix such as `help:` or `all:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NamespaceSelector {
    /// Every namespace.
    All,
    /// A single namespace id.
    Id(i32),
}

impl fmt::Display for NamespaceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Id(id) => write!(f, "{id}"),
        }
    }
}

/// Namespaces a query requires on top of the requested ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredNamespaces {
    /// The query must search every namespace.
    All,
    /// The query must search at least these namespaces.
    Ids(BTreeSet<i32>),
}

impl Default for RequiredNamespaces {
    fn default() -> Self {
        Self::Ids(BTreeSet::new())
    }
}

impl RequiredNamespaces {
    /// Merges `other` into `self`. `All` absorbs everything.
    pub fn union(&mut self, other: Self) {
        match other {
            Self::All => *self = Self::All,
            Self::Ids(more) => {
                if let Self::Ids(ids) = self {
                    ids.extend(more);
                }
            }
        }
    }

    /// Returns true if every namespace is required.
    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

/// Main (article) namespace id.
pub const NS_MAIN: i32 = 0;

/// Resolves a namespace prefix at the start of a query.
pub trait NamespacePrefixParser: fmt::Debug + Send + Sync {
    /// Splits `query` into the text after the prefix and the selected
    /// namespace, or returns `None` if it does not start with one.
    ///
    /// The remainder must be a suffix of `query`.
    fn parse<'q>(&self, query: &'q str) -> Option<(&'q str, NamespaceSelector)>;
}

/// Table-driven namespace resolver.
///
/// Names match case-insensitively, with `_` and space treated alike. The
/// prefix `all:` selects every namespace.
#[derive(Debug, Clone, Default)]
pub struct StaticNamespaces {
    /// Normalized name to id.
    names: BTreeMap<String, i32>,
}

impl StaticNamespaces {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a namespace name.
    pub fn with(mut self, name: &str, id: i32) -> Self {
        self.insert(name, id);
        self
    }

    /// Adds a namespace name.
    pub fn insert(&mut self, name: &str, id: i32) {
        self.names.insert(normalize(name), id);
    }

    /// Looks up a namespace name.
    pub fn id(&self, name: &str) -> Option<i32> {
        self.names.get(&normalize(name)).copied()
    }

    /// A few common wiki namespaces.
    pub fn wiki_defaults() -> Self {
        Self::new()
            .with("talk", 1)
            .with("user", 2)
            .with("user talk", 3)
            .with("project", 4)
            .with("file", 6)
            .with("template", 10)
            .with("help", 12)
            .with("category", 14)
    }
}

impl<S: AsRef<str>> FromIterator<(S, i32)> for StaticNamespaces {
    fn from_iter<I: IntoIterator<Item = (S, i32)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (name, id) in iter {
            table.insert(name.as_ref(), id);
        }
        table
    }
}

impl NamespacePrefixParser for StaticNamespaces {
    fn parse<'q>(&self, query: &'q str) -> Option<(&'q str, NamespaceSelector)> {
        let colon = query.find(':')?;
        let name = &query[..colon];
        let remainder = &query[colon + 1..];
        if name.is_empty() {
            return None;
        }
        if name.eq_ignore_ascii_case("all") {
            return Some((remainder, NamespaceSelector::All));
        }
        self.id(name)
            .map(|id| (remainder, NamespaceSelector::Id(id)))
    }
}

/// Normalizes a namespace name for lookup.
fn normalize(name: &str) -> String {
    name.trim().to_lowercase().replace('_', " ")
}
