//! Configuration validation.
//!
//! Validates a loaded configuration and reports warnings for settings that load fine but are
//! unlikely to do what the user meant.

use std::{fmt, sync::Arc};

use sift_query::{KeywordRegistry, QUERY_LEN_HARD_LIMIT, StaticNamespaces};

use crate::Config;

/// A non-fatal warning about the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// `max_query_length` is zero, so every non-empty query is rejected.
    ZeroMaxQueryLength,
    /// `max_query_length` exceeds the absolute limit, which still applies.
    MaxQueryLengthAboveHardLimit {
        /// Configured limit.
        max: usize,
    },
    /// A namespace name is empty after trimming.
    EmptyNamespaceName {
        /// Namespace id.
        id: i32,
    },
    /// A namespace has a negative id; those namespaces hold no searchable pages.
    NegativeNamespaceId {
        /// Namespace name.
        name: String,
        /// Namespace id.
        id: i32,
    },
    /// A namespace name is also a keyword prefix. Queries starting with `name:` select the
    /// namespace and the keyword is never recognized there.
    NamespaceShadowsKeyword {
        /// Namespace name.
        name: String,
        /// Keyword feature using the same prefix.
        feature: String,
    },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroMaxQueryLength => {
                write!(f, "parser.max_query_length is 0, every query will be rejected")
            }
            Self::MaxQueryLengthAboveHardLimit { max } => write!(
                f,
                "parser.max_query_length {max} exceeds the hard limit of {QUERY_LEN_HARD_LIMIT}"
            ),
            Self::EmptyNamespaceName { id } => write!(f, "namespace {id} has an empty name"),
            Self::NegativeNamespaceId { name, id } => {
                write!(f, "namespace '{name}' has negative id {id}")
            }
            Self::NamespaceShadowsKeyword { name, feature } => write!(
                f,
                "namespace '{name}' shadows the '{feature}' keyword at the start of queries"
            ),
        }
    }
}

/// Validates the configuration and returns any warnings.
pub fn validate_config(config: &Config) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    match config.parser.max_query_length {
        0 => warnings.push(ConfigWarning::ZeroMaxQueryLength),
        max if max > QUERY_LEN_HARD_LIMIT => {
            warnings.push(ConfigWarning::MaxQueryLengthAboveHardLimit { max });
        }
        _ => {}
    }

    for (name, &id) in &config.namespaces {
        if name.trim().is_empty() {
            warnings.push(ConfigWarning::EmptyNamespaceName { id });
            continue;
        }
        if id < 0 {
            warnings.push(ConfigWarning::NegativeNamespaceId {
                name: name.clone(),
                id,
            });
        }
    }

    warnings.extend(shadowed_keywords(config));
    warnings
}

/// Finds configured namespace names that collide with keyword prefixes.
fn shadowed_keywords(config: &Config) -> Vec<ConfigWarning> {
    let Ok(registry) = KeywordRegistry::builtin(Arc::new(StaticNamespaces::new())) else {
        return Vec::new();
    };

    let mut warnings = Vec::new();
    for name in config.namespaces.keys() {
        let normalized = name.trim().to_lowercase().replace('_', " ");
        let shadowed = registry.scan_order().into_iter().find(|registered| {
            registered
                .feature()
                .prefixes()
                .iter()
                .any(|prefix| *prefix == normalized)
        });
        if let Some(registered) = shadowed {
            warnings.push(ConfigWarning::NamespaceShadowsKeyword {
                name: name.clone(),
                feature: registered.feature().name().to_string(),
            });
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn with_namespaces(namespaces: &[(&str, i32)]) -> Config {
        Config {
            namespaces: namespaces
                .iter()
                .map(|(name, id)| ((*name).to_string(), *id))
                .collect::<BTreeMap<_, _>>(),
            ..Config::default()
        }
    }

    #[test]
    fn default_config_is_clean() {
        assert!(Config::default().validate().is_empty());
    }

    #[test]
    fn query_length_bounds() {
        let mut config = Config::default();
        config.parser.max_query_length = 0;
        assert_eq!(config.validate(), vec![ConfigWarning::ZeroMaxQueryLength]);

        config.parser.max_query_length = 5000;
        assert_eq!(
            config.validate(),
            vec![ConfigWarning::MaxQueryLengthAboveHardLimit { max: 5000 }]
        );
    }

    #[test]
    fn namespace_names_and_ids() {
        let config = with_namespaces(&[(" ", 7), ("special", -1), ("portal", 100)]);
        assert_eq!(
            config.validate(),
            vec![
                ConfigWarning::EmptyNamespaceName { id: 7 },
                ConfigWarning::NegativeNamespaceId {
                    name: "special".into(),
                    id: -1
                },
            ]
        );
    }

    #[test]
    fn keyword_shadowing() {
        let config = with_namespaces(&[("InTitle", 500), ("prefer_recent", 501)]);
        assert_eq!(
            config.validate(),
            vec![
                ConfigWarning::NamespaceShadowsKeyword {
                    name: "InTitle".into(),
                    feature: "intitle".into(),
                },
            ]
        );
    }

    #[test]
    fn warning_display() {
        let warning = ConfigWarning::NamespaceShadowsKeyword {
            name: "intitle".into(),
            feature: "intitle".into(),
        };
        assert_eq!(
            warning.to_string(),
            "namespace 'intitle' shadows the 'intitle' keyword at the start of queries"
        );
        assert_eq!(
            ConfigWarning::MaxQueryLengthAboveHardLimit { max: 3000 }.to_string(),
            "parser.max_query_length 3000 exceeds the hard limit of 2048"
        );
    }
}
