//! Ordered collection of keyword features.

use std::sync::Arc;

use super::{
    KeywordFeature, ListFeature, LocalFeature, MoreLikeFeature, PreferRecentFeature,
    PrefixFeature, RegexFeature, SimpleKeyword,
};
use crate::{error::RegistryError, keyword::KeywordMatcher, namespace::NamespacePrefixParser};

/// Scan phase of a feature. Phases run in declaration order.
///
/// Headers must claim the start of the query before greedy features swallow
/// it, and features allowing empty values must see `key:` before normal
/// features can claim what follows the colon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScanBucket {
    /// Query headers with a bounded value.
    Header,
    /// Query headers capturing the rest of the query.
    GreedyHeader,
    /// Features capturing the rest of the query.
    Greedy,
    /// Features accepting `key:` without a value.
    AllowsEmpty,
    /// Everything else.
    Normal,
}

impl ScanBucket {
    /// Phase in which `feature` is scanned.
    pub fn of(feature: &dyn KeywordFeature) -> Self {
        match (
            feature.query_header(),
            feature.greedy(),
            feature.allow_empty_value(),
        ) {
            (true, false, _) => Self::Header,
            (true, true, _) => Self::GreedyHeader,
            (false, true, _) => Self::Greedy,
            (false, false, true) => Self::AllowsEmpty,
            (false, false, false) => Self::Normal,
        }
    }
}

/// A feature together with its compiled matcher.
#[derive(Debug)]
pub struct RegisteredFeature {
    /// The feature definition.
    feature: Box<dyn KeywordFeature>,
    /// Compiled scanner for the feature.
    matcher: KeywordMatcher,
    /// Scan phase.
    bucket: ScanBucket,
}

impl RegisteredFeature {
    /// The feature definition.
    pub fn feature(&self) -> &dyn KeywordFeature {
        self.feature.as_ref()
    }

    /// The compiled matcher.
    pub const fn matcher(&self) -> &KeywordMatcher {
        &self.matcher
    }

    /// Scan phase.
    pub const fn bucket(&self) -> ScanBucket {
        self.bucket
    }
}

/// Keyword features known to a parser.
#[derive(Debug, Default)]
pub struct KeywordRegistry {
    /// Features in registration order.
    features: Vec<RegisteredFeature>,
}

impl KeywordRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in feature.
    pub fn builtin(namespaces: Arc<dyn NamespacePrefixParser>) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.register(LocalFeature)?;
        registry.register(MoreLikeFeature)?;
        registry.register(PrefixFeature::new(namespaces))?;
        registry.register(PreferRecentFeature::default())?;
        registry.register(RegexFeature::intitle(true))?;
        registry.register(RegexFeature::insource(true))?;
        registry.register(ListFeature::incategory())?;
        registry.register(ListFeature::articletopic())?;
        registry.register(SimpleKeyword::new("hastemplate", &["hastemplate"]))?;
        registry.register(SimpleKeyword::new("linksto", &["linksto"]))?;
        Ok(registry)
    }

    /// Adds a feature, returning the registry.
    pub fn with(mut self, feature: impl KeywordFeature + 'static) -> Result<Self, RegistryError> {
        self.register(feature)?;
        Ok(self)
    }

    /// Adds a feature.
    pub fn register(&mut self, feature: impl KeywordFeature + 'static) -> Result<(), RegistryError> {
        let name = feature.name().to_string();
        if self.get(&name).is_some() {
            return Err(RegistryError::Duplicate(name));
        }
        if feature.prefixes().is_empty() {
            return Err(RegistryError::NoPrefixes(name));
        }
        if feature.greedy() && feature.allow_empty_value() {
            return Err(RegistryError::GreedyWithEmptyValue(name));
        }

        let matcher = KeywordMatcher::new(&feature)
            .map_err(|source| RegistryError::InvalidPattern {
                name: name.clone(),
                source,
            })?;
        let bucket = ScanBucket::of(&feature);
        self.features.push(RegisteredFeature {
            feature: Box::new(feature),
            matcher,
            bucket,
        });
        Ok(())
    }

    /// Looks up a feature by name.
    pub fn get(&self, name: &str) -> Option<&dyn KeywordFeature> {
        self.features
            .iter()
            .find(|f| f.feature.name() == name)
            .map(RegisteredFeature::feature)
    }

    /// Feature names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|f| f.feature.name())
    }

    /// Number of registered features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns true if no feature is registered.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Features in scan order: grouped by [`ScanBucket`], registration
    /// order within a bucket.
    pub fn scan_order(&self) -> Vec<&RegisteredFeature> {
        let mut ordered: Vec<&RegisteredFeature> = self.features.iter().collect();
        ordered.sort_by_key(|f| f.bucket);
        ordered
    }
}
