//! Locating the `.sift.toml` files that apply to a directory.
//!
//! Local files are read from the directory and its ancestors. The file in the
//! home directory comes last, unless a local file declared itself the root.

use std::path::{Path, PathBuf};

use directories::BaseDirs;

use crate::parse::parse_config_file;

/// The configuration filename.
pub const CONFIG_FILENAME: &str = ".sift.toml";

/// Configuration files from a directory and its ancestors.
struct LocalConfigs {
    /// Existing files, nearest first.
    files: Vec<PathBuf>,
    /// True when a file with `root = true` ended the walk.
    rooted: bool,
}

/// Lists the configuration files that apply to `cwd`, highest precedence first.
pub fn discover_config_files(cwd: &Path) -> Vec<PathBuf> {
    let LocalConfigs { mut files, rooted } = local_configs(cwd);
    if !rooted
        && let Some(global) = existing_global_config()
        && !files.contains(&global)
    {
        files.push(global);
    }
    files
}

/// Collects config files from `start` upward, stopping after a root file.
fn local_configs(start: &Path) -> LocalConfigs {
    let mut files = Vec::new();
    let candidates = start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .filter(|path| path.is_file());
    for path in candidates {
        let rooted = declares_root(&path);
        files.push(path);
        if rooted {
            return LocalConfigs { files, rooted };
        }
    }
    LocalConfigs {
        files,
        rooted: false,
    }
}

/// Reads the `root` flag of a config file. Unreadable or invalid files are
/// not roots; loading reports their errors later.
fn declares_root(path: &Path) -> bool {
    parse_config_file(path)
        .ok()
        .and_then(|config| config.root)
        .unwrap_or(false)
}

/// The global config path, if that file exists.
fn existing_global_config() -> Option<PathBuf> {
    global_config_path().filter(|path| path.is_file())
}

/// Path of `~/.sift.toml`, or `None` without a home directory.
pub fn global_config_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().join(CONFIG_FILENAME))
}

/// Returns true if `path` is `~/.sift.toml`.
pub fn is_global_config(path: &Path) -> bool {
    global_config_path().is_some_and(|global| path == global)
}
