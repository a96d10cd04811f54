//! Configuration system for sift.
//!
//! sift uses TOML configuration files named `.sift.toml`. Configuration is resolved by walking
//! up the directory tree from the current working directory, collecting any `.sift.toml` files
//! found, then loading `~/.sift.toml` as the global config with lowest precedence.
//!
//! The merged [`Config`] converts into the query parser's [`ParserSettings`] and namespace
//! table.

#![warn(missing_docs)]

mod discovery;
mod error;
mod merge;
mod parse;
mod templates;
#[cfg(test)]
mod test_support;
mod validate;

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

pub use discovery::{CONFIG_FILENAME, discover_config_files, global_config_path, is_global_config};
pub use error::ConfigError;
pub use merge::{ParsedConfig, merge_configs};
pub use parse::{RawConfig, RawParserSettings, parse_config_file, parse_config_str};
use serde::{Deserialize, Serialize};
use sift_query::{ParserSettings, QuestionMarkStripLevel, StaticNamespaces, UnknownStripLevel};
pub use templates::{global_template, local_template};
pub use validate::ConfigWarning;
use validate::validate_config;

/// Top-level merged configuration for sift.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parser settings.
    pub parser: ParserConfig,
    /// Namespace names added to the built-in table, by name.
    pub namespaces: BTreeMap<String, i32>,
    /// Directory containing the most specific config file.
    pub config_root: Option<PathBuf>,
    /// Files the configuration was merged from, highest precedence first.
    pub files: Vec<PathBuf>,
}

impl Config {
    /// Loads configuration by discovering and merging all relevant `.sift.toml` files.
    ///
    /// Returns `Ok(Config::default())` if no configuration files are found.
    pub fn load(cwd: &Path) -> Result<Self, ConfigError> {
        let config_files = discover_config_files(cwd);
        Self::load_from_files(&config_files)
    }

    /// Loads configuration from a specific list of config file paths, highest precedence
    /// first.
    pub fn load_from_files(files: &[PathBuf]) -> Result<Self, ConfigError> {
        if files.is_empty() {
            return Ok(Self::default());
        }

        let parsed: Vec<ParsedConfig> = files
            .iter()
            .map(|path| {
                let config = parse_config_file(path)?;
                Ok(ParsedConfig {
                    path: path.clone(),
                    config,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(merge_configs(&parsed))
    }

    /// Converts the `[parser]` section into parser settings.
    pub fn parser_settings(&self) -> Result<ParserSettings, ConfigError> {
        let question_marks = self
            .parser
            .question_marks
            .parse::<QuestionMarkStripLevel>()
            .map_err(|UnknownStripLevel(value)| ConfigError::InvalidValue {
                key: "parser.question_marks".to_string(),
                value,
                reason: "expected none, final, break or all".to_string(),
            })?;

        Ok(ParserSettings {
            question_marks,
            max_query_length: self.parser.max_query_length,
            language: self.parser.language.clone(),
            allow_leading_wildcard: self.parser.allow_leading_wildcard,
        })
    }

    /// Builds the namespace table: the built-in wiki names plus `[namespaces]`.
    pub fn namespace_table(&self) -> StaticNamespaces {
        let mut table = StaticNamespaces::wiki_defaults();
        for (name, id) in &self.namespaces {
            table.insert(name, *id);
        }
        table
    }

    /// Validates the configuration and returns any warnings.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        validate_config(self)
    }

    /// Serializes the effective settings to TOML, in `.sift.toml` format.
    pub fn settings_to_toml(&self) -> String {
        let serializable = SerializableConfig {
            parser: &self.parser,
            namespaces: &self.namespaces,
        };
        toml::to_string_pretty(&serializable).expect("settings serialization should not fail")
    }
}

/// The `[parser]` section with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Question mark stripping level, kept as written until [`Config::parser_settings`].
    pub question_marks: String,
    /// Maximum cleaned query length in characters.
    pub max_query_length: usize,
    /// Content language code.
    pub language: String,
    /// Whether wildcard terms may start with a wildcard.
    pub allow_leading_wildcard: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        let settings = ParserSettings::default();
        Self {
            question_marks: settings.question_marks.to_string(),
            max_query_length: settings.max_query_length,
            language: settings.language,
            allow_leading_wildcard: settings.allow_leading_wildcard,
        }
    }
}

/// Borrowed view of the settings for TOML output.
#[derive(Serialize)]
struct SerializableConfig<'a> {
    /// Parser settings.
    parser: &'a ParserConfig,
    /// Namespace table additions.
    namespaces: &'a BTreeMap<String, i32>,
}
