//! Integration tests for sift-config.
//!
//! Tests the full configuration loading pipeline: discovery -> parse -> merge -> parser.

#![allow(clippy::tests_outside_test_module)]

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use sift_config::{Config, ConfigError, ConfigWarning, local_template};
use sift_query::{NamespaceSelector, Parser, QueryError};

/// Test helper to create a temporary directory structure for tests.
struct TestEnv {
    root: tempfile::TempDir,
}

impl TestEnv {
    fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.root.path()
    }

    /// Creates a directory and returns its path.
    fn create_dir(&self, rel_path: &str) -> PathBuf {
        let path = self.root.path().join(rel_path);
        fs::create_dir_all(&path).unwrap();
        path
    }

    /// Creates a file with content and returns its path.
    fn create_file(&self, rel_path: &str, content: &str) -> PathBuf {
        let path = self.root.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }
}

fn parser_for(config: &Config) -> Parser {
    Parser::from_settings(
        &config.parser_settings().unwrap(),
        Arc::new(config.namespace_table()),
    )
    .unwrap()
}

#[test]
fn no_files_is_default() {
    let config = Config::load_from_files(&[]).unwrap();
    assert!(config.files.is_empty());
    assert!(config.config_root.is_none());
    assert_eq!(config.parser.max_query_length, 300);
    assert_eq!(config.parser.question_marks, "final");
}

#[test]
fn single_root_config() {
    let env = TestEnv::new();
    let path = env.create_file(
        ".sift.toml",
        "root = true\n\n[parser]\nmax_query_length = 50\n",
    );

    let config = Config::load(env.path()).unwrap();
    assert_eq!(config.files, vec![path]);
    assert_eq!(config.parser.max_query_length, 50);
    assert_eq!(config.config_root.as_deref(), Some(env.path()));
}

#[test]
fn nested_configs_merge() {
    let env = TestEnv::new();
    let subdir = env.create_dir("project/subdir");

    env.create_file(
        ".sift.toml",
        r#"
root = true

[parser]
max_query_length = 100
language = "de"

[namespaces]
portal = 100
"#,
    );
    env.create_file(
        "project/.sift.toml",
        r#"
[parser]
max_query_length = 20

[namespaces]
portal = 200
draft = 118
"#,
    );

    let config = Config::load(&subdir).unwrap();
    assert_eq!(config.files.len(), 2);
    assert_eq!(config.parser.max_query_length, 20);
    assert_eq!(config.parser.language, "de");
    assert_eq!(config.namespaces["portal"], 200);
    assert_eq!(config.namespaces["draft"], 118);
    assert_eq!(
        config.config_root.as_deref(),
        Some(env.path().join("project").as_path())
    );
}

#[test]
fn root_stops_discovery() {
    let env = TestEnv::new();
    let subdir = env.create_dir("project/subdir");
    env.create_file(".sift.toml", "[parser]\nlanguage = \"fr\"\n");
    env.create_file("project/.sift.toml", "root = true\n");

    let config = Config::load(&subdir).unwrap();
    assert_eq!(config.files, vec![env.path().join("project/.sift.toml")]);
    assert_eq!(config.parser.language, "en");
}

#[test]
fn invalid_toml_reports_path() {
    let env = TestEnv::new();
    let path = env.create_file(".sift.toml", "root = true\n[parser\n");

    let err = Config::load(env.path()).unwrap_err();
    assert!(matches!(&err, ConfigError::ParseToml { path: p, .. } if *p == path));
    assert!(err.to_string().contains(".sift.toml"));
}

#[test]
fn invalid_question_marks_fails_conversion() {
    let env = TestEnv::new();
    env.create_file(
        ".sift.toml",
        "root = true\n[parser]\nquestion_marks = \"most\"\n",
    );

    let config = Config::load(env.path()).unwrap();
    assert!(matches!(
        config.parser_settings(),
        Err(ConfigError::InvalidValue { .. })
    ));
}

#[test]
fn configured_parser_enforces_limit() {
    let env = TestEnv::new();
    env.create_file(
        ".sift.toml",
        "root = true\n[parser]\nmax_query_length = 10\n",
    );
    let config = Config::load(env.path()).unwrap();
    let parser = parser_for(&config);

    assert!(parser.parse("short").is_ok());
    assert_eq!(
        parser.parse("a much longer query").unwrap_err(),
        QueryError::too_long(19, 10)
    );
}

#[test]
fn configured_namespaces_select_header() {
    let env = TestEnv::new();
    env.create_file(
        ".sift.toml",
        "root = true\n[namespaces]\nportal = 100\n",
    );
    let config = Config::load(env.path()).unwrap();
    let parser = parser_for(&config);

    let parsed = parser.parse("portal:science").unwrap();
    assert_eq!(parsed.header_namespace(), Some(NamespaceSelector::Id(100)));
    assert_eq!(parsed.query_without_namespace_header(), "science");

    let builtin = parser.parse("help:editing").unwrap();
    assert_eq!(builtin.header_namespace(), Some(NamespaceSelector::Id(12)));
}

#[test]
fn validation_warnings_survive_loading() {
    let env = TestEnv::new();
    env.create_file(
        ".sift.toml",
        "root = true\n[parser]\nmax_query_length = 0\n\n[namespaces]\nintitle = 500\n",
    );
    let warnings = Config::load(env.path()).unwrap().validate();
    assert_eq!(warnings.len(), 2);
    assert_eq!(warnings[0], ConfigWarning::ZeroMaxQueryLength);
    assert!(matches!(
        &warnings[1],
        ConfigWarning::NamespaceShadowsKeyword { name, .. } if name == "intitle"
    ));
}

#[test]
fn initialized_config_loads() {
    let env = TestEnv::new();
    env.create_file(".sift.toml", &local_template());

    let config = Config::load_from_files(&[env.path().join(".sift.toml")]).unwrap();
    assert!(config.namespaces.is_empty());
    assert!(config.validate().is_empty());
}

#[test]
fn effective_settings_round_trip() {
    let env = TestEnv::new();
    env.create_file(
        ".sift.toml",
        "root = true\n[parser]\nlanguage = \"nl\"\n[namespaces]\nportal = 100\n",
    );
    let config = Config::load(env.path()).unwrap();

    let written = env.create_file("effective/.sift.toml", &config.settings_to_toml());
    let reloaded = Config::load_from_files(&[written]).unwrap();
    assert_eq!(reloaded.parser, config.parser);
    assert_eq!(reloaded.namespaces, config.namespaces);
}
