//! Query classification.
//!
//! A classifier tags a [`ParsedQuery`] with zero or more of the classes it
//! knows. Classifiers are grouped in a [`ClassifierRepository`], which maps
//! every class to the classifier producing it.

use std::{collections::BTreeMap, fmt};

use crate::{
    ast::{Node, Occur},
    error::ClassifierError,
    query::ParsedQuery,
};

/// Only plain words.
pub const SIMPLE_BAG_OF_WORDS: &str = "simple_bag_of_words";
/// A single phrase.
pub const SIMPLE_PHRASE: &str = "simple_phrase";
/// Plain words and phrases, without operators.
pub const BAG_OF_WORDS_WITH_PHRASE: &str = "bag_of_words_with_phrase";
/// Keywords, operators, negation or special terms.
pub const COMPLEX_QUERY: &str = "complex_query";
/// The parser had to recover from syntax errors.
pub const BOGUS_QUERY: &str = "bogus_query";

/// Tags parsed queries with classes.
pub trait QueryClassifier: fmt::Debug + Send + Sync {
    /// Every class this classifier can produce.
    fn classes(&self) -> &[&'static str];

    /// Classes `query` belongs to.
    fn classify(&self, query: &ParsedQuery) -> Vec<&'static str>;
}

/// Classifiers indexed by the classes they produce.
#[derive(Debug)]
pub struct ClassifierRepository {
    /// Registered classifiers.
    classifiers: Vec<Box<dyn QueryClassifier>>,
    /// Class to index into `classifiers`.
    by_class: BTreeMap<&'static str, usize>,
}

impl Default for ClassifierRepository {
    fn default() -> Self {
        Self::empty().with(BasicQueryClassifier)
    }
}

impl ClassifierRepository {
    /// A repository without classifiers.
    pub const fn empty() -> Self {
        Self {
            classifiers: Vec::new(),
            by_class: BTreeMap::new(),
        }
    }

    /// Adds a classifier. A class already produced by an earlier classifier
    /// is taken over by `classifier`.
    pub fn with(mut self, classifier: impl QueryClassifier + 'static) -> Self {
        let index = self.classifiers.len();
        for class in classifier.classes() {
            self.by_class.insert(*class, index);
        }
        self.classifiers.push(Box::new(classifier));
        self
    }

    /// The classifier producing `class`.
    pub fn get(&self, class: &str) -> Result<&dyn QueryClassifier, ClassifierError> {
        self.by_class
            .get(class)
            .and_then(|&index| self.classifiers.get(index))
            .map(|classifier| &**classifier)
            .ok_or_else(|| ClassifierError::UnknownClass(class.to_string()))
    }

    /// Every known class.
    pub fn classes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.by_class.keys().copied()
    }

    /// Registered classifiers, in registration order.
    pub fn classifiers(&self) -> impl Iterator<Item = &dyn QueryClassifier> {
        self.classifiers.iter().map(|classifier| &**classifier)
    }
}

/// Structural classification of the query tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicQueryClassifier;

impl QueryClassifier for BasicQueryClassifier {
    fn classes(&self) -> &[&'static str] {
        &[
            SIMPLE_BAG_OF_WORDS,
            SIMPLE_PHRASE,
            BAG_OF_WORDS_WITH_PHRASE,
            COMPLEX_QUERY,
            BOGUS_QUERY,
        ]
    }

    fn classify(&self, query: &ParsedQuery) -> Vec<&'static str> {
        let mut classes = Vec::new();
        if !query.warnings().is_empty() {
            classes.push(BOGUS_QUERY);
        }
        if query.namespace_header().is_some() {
            classes.push(COMPLEX_QUERY);
            return classes;
        }

        match query.root() {
            Node::Empty { .. } => {}
            Node::Words { .. } => classes.push(SIMPLE_BAG_OF_WORDS),
            Node::Phrase { .. } => classes.push(SIMPLE_PHRASE),
            Node::Boolean { clauses, .. } => {
                let simple = clauses.iter().all(|c| {
                    c.occur == Occur::Must
                        && !c.explicit
                        && matches!(c.node, Node::Words { .. } | Node::Phrase { .. })
                });
                if !simple {
                    classes.push(COMPLEX_QUERY);
                } else if clauses.iter().any(|c| matches!(c.node, Node::Phrase { .. })) {
                    classes.push(BAG_OF_WORDS_WITH_PHRASE);
                } else {
                    classes.push(SIMPLE_BAG_OF_WORDS);
                }
            }
            _ => classes.push(COMPLEX_QUERY),
        }
        classes
    }
}
