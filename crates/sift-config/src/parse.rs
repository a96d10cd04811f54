//! Configuration file parsing.
//!
//! Parses individual `.sift.toml` files into `RawConfig` structures that keep
//! every field optional until merging.

use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;
#[cfg(test)]
use toml::de::Error as TomlError;

use crate::ConfigError;

/// Raw configuration as parsed directly from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawConfig {
    /// When true, stop discovery here - ignore parent and global configs.
    pub root: Option<bool>,
    /// Parser settings section.
    pub parser: Option<RawParserSettings>,
    /// Namespace name to namespace id.
    pub namespaces: Option<BTreeMap<String, i32>>,
}

/// Raw `[parser]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawParserSettings {
    /// Question mark stripping level: `none`, `final`, `break` or `all`.
    pub question_marks: Option<String>,
    /// Maximum cleaned query length in characters.
    pub max_query_length: Option<usize>,
    /// Content language code.
    pub language: Option<String>,
    /// Whether wildcard terms may start with a wildcard.
    pub allow_leading_wildcard: Option<bool>,
}

/// Parses a configuration file from disk.
pub fn parse_config_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config_str(&contents, path)
}

/// Parses configuration from a TOML string.
///
/// The `path` parameter is used for error reporting.
pub fn parse_config_str(contents: &str, path: &Path) -> Result<RawConfig, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses configuration from a TOML string without path context.
#[cfg(test)]
pub fn parse_config(contents: &str) -> Result<RawConfig, TomlError> {
    toml::from_str(contents)
}
