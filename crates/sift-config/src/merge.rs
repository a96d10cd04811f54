//! Configuration merging.
//!
//! Merges multiple `RawConfig` files into a single `Config`, applying precedence rules.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use crate::{
    Config, ParserConfig,
    parse::{RawConfig, RawParserSettings},
};

/// A parsed config file with its source path.
#[derive(Debug)]
pub struct ParsedConfig {
    /// Path to the config file.
    pub path: PathBuf,
    /// Parsed raw configuration.
    pub config: RawConfig,
}

/// Merges multiple configuration files into a single `Config`.
///
/// Configs should be provided in precedence order: highest precedence first (closest to CWD),
/// lowest precedence last (global config).
///
/// Merge rules:
/// - Scalar settings: first defined value wins (highest precedence)
/// - Namespaces: merged by name, first definition of each name wins
pub fn merge_configs(configs: &[ParsedConfig]) -> Config {
    let config_root = configs
        .first()
        .and_then(|c| c.path.parent())
        .map(Path::to_path_buf);

    let mut parser = ParserConfig::default();
    let mut namespaces = BTreeMap::new();
    // Lowest precedence first so higher precedence overwrites.
    for parsed in configs.iter().rev() {
        if let Some(ref raw) = parsed.config.parser {
            apply_raw_parser(&mut parser, raw);
        }
        if let Some(ref raw) = parsed.config.namespaces {
            namespaces.extend(raw.iter().map(|(name, id)| (name.clone(), *id)));
        }
    }

    Config {
        parser,
        namespaces,
        config_root,
        files: configs.iter().map(|c| c.path.clone()).collect(),
    }
}

/// Applies raw parser settings to result, overwriting any present values.
fn apply_raw_parser(result: &mut ParserConfig, raw: &RawParserSettings) {
    if let Some(ref v) = raw.question_marks {
        result.question_marks.clone_from(v);
    }
    if let Some(v) = raw.max_query_length {
        result.max_query_length = v;
    }
    if let Some(ref v) = raw.language {
        result.language.clone_from(v);
    }
    if let Some(v) = raw.allow_leading_wildcard {
        result.allow_leading_wildcard = v;
    }
}
