//! The result of parsing a query.

use std::{collections::BTreeSet, sync::Arc};

use serde::Serialize;

use crate::{
    ast::Node,
    classify::ClassifierRepository,
    cleanup::Cleanup,
    error::{ClassifierError, ParseWarning},
    namespace::{NamespaceSelector, RequiredNamespaces},
};

/// Feature name reported for a namespace header.
pub const NAMESPACE_HEADER_FEATURE: &str = "namespace_header";

/// A parsed query: the tree plus everything learned while building it.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedQuery {
    /// Root of the tree.
    pub(crate) root: Node,
    /// Cleaned query, which all spans refer to.
    pub(crate) query: String,
    /// Query as received.
    pub(crate) raw_query: String,
    /// Cleanups that changed the query.
    pub(crate) cleanups: BTreeSet<Cleanup>,
    /// Namespace header, if the query started with one.
    pub(crate) namespace_header: Option<Node>,
    /// Namespaces keyword features need searched.
    pub(crate) required_namespaces: RequiredNamespaces,
    /// Recovered syntax errors and feature warnings.
    pub(crate) warnings: Vec<ParseWarning>,
    /// Classifiers consulted by [`ParsedQuery::is_query_of_class`].
    #[serde(skip)]
    pub(crate) classifiers: Arc<ClassifierRepository>,
}

impl ParsedQuery {
    /// Root of the tree.
    pub const fn root(&self) -> &Node {
        &self.root
    }

    /// The cleaned query, including any namespace header.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The query as received.
    pub fn raw_query(&self) -> &str {
        &self.raw_query
    }

    /// The cleaned query after the namespace header.
    pub fn query_without_namespace_header(&self) -> &str {
        match &self.namespace_header {
            Some(header) => &self.query[header.span().end..],
            None => &self.query,
        }
    }

    /// Cleanups applied to the raw query.
    pub const fn cleanups(&self) -> &BTreeSet<Cleanup> {
        &self.cleanups
    }

    /// Returns true if `cleanup` changed the raw query.
    pub fn has_cleanup(&self, cleanup: Cleanup) -> bool {
        self.cleanups.contains(&cleanup)
    }

    /// The namespace header node, if any.
    pub const fn namespace_header(&self) -> Option<&Node> {
        self.namespace_header.as_ref()
    }

    /// Namespace selected by the header, if any.
    pub const fn header_namespace(&self) -> Option<NamespaceSelector> {
        match &self.namespace_header {
            Some(Node::NamespaceHeader { namespace, .. }) => Some(*namespace),
            _ => None,
        }
    }

    /// Namespaces required by keyword features.
    pub const fn required_namespaces(&self) -> &RequiredNamespaces {
        &self.required_namespaces
    }

    /// Warnings collected while parsing.
    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    /// Names of the keyword features used, in query order, followed by
    /// [`NAMESPACE_HEADER_FEATURE`] if the query has a header.
    pub fn features_used(&self) -> Vec<&str> {
        let mut features: Vec<&str> = Vec::new();
        self.root.visit_keywords(&mut |keyword| {
            if !features.contains(&keyword.feature.as_str()) {
                features.push(&keyword.feature);
            }
        });
        if self.namespace_header.is_some() {
            features.push(NAMESPACE_HEADER_FEATURE);
        }
        features
    }

    /// Namespaces that have to be searched to run this query.
    ///
    /// `requested` are the namespaces initially selected by the caller and
    /// `additional` those required by other filters. An empty result means
    /// every namespace.
    pub fn actual_namespaces(&self, requested: Option<&[i32]>, additional: Option<&[i32]>) -> Vec<i32> {
        let required = match &self.required_namespaces {
            RequiredNamespaces::All => return Vec::new(),
            RequiredNamespaces::Ids(ids) => ids,
        };
        if additional.is_some_and(<[i32]>::is_empty) {
            return Vec::new();
        }

        let base: Vec<i32> = match self.header_namespace() {
            Some(NamespaceSelector::All) => return Vec::new(),
            Some(NamespaceSelector::Id(id)) => vec![id],
            None => match requested {
                Some(ids) if !ids.is_empty() => ids.to_vec(),
                _ => return Vec::new(),
            },
        };

        let mut namespaces = Vec::new();
        let all = base
            .into_iter()
            .chain(required.iter().copied())
            .chain(additional.unwrap_or_default().iter().copied());
        for id in all {
            if !namespaces.contains(&id) {
                namespaces.push(id);
            }
        }
        namespaces
    }

    /// Returns true if the query belongs to `class`.
    pub fn is_query_of_class(&self, class: &str) -> Result<bool, ClassifierError> {
        let classifier = self.classifiers.get(class)?;
        Ok(classifier.classify(self).contains(&class))
    }

    /// Every class of the registered classifiers this query belongs to.
    pub fn query_classes(&self) -> Vec<&'static str> {
        self.classifiers
            .classifiers()
            .flat_map(|classifier| classifier.classify(self))
            .collect()
    }
}
