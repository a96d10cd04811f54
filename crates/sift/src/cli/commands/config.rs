//! Implementation of `sift config`.

use std::process::ExitCode;

use sift_config::is_global_config;

use crate::cli::{
    context::CommandContext,
    output::{dim, subheader, warning},
};

/// Shows discovered config files, effective settings and configuration warnings.
pub fn run(ctx: &CommandContext) -> ExitCode {
    let config = &ctx.config;

    println!("{}", subheader("Config files (highest precedence first):"));
    if config.files.is_empty() {
        println!("  {}", dim("(none found, run 'sift init' to create one)"));
    }
    for path in &config.files {
        let scope = if is_global_config(path) { "global" } else { "local" };
        println!("  {} {}", path.display(), dim(&format!("({scope})")));
    }
    println!();

    println!("{}", subheader("Effective settings:"));
    print!("{}", config.settings_to_toml());

    let warnings = config.validate();
    if !warnings.is_empty() {
        eprintln!();
        for config_warning in &warnings {
            eprintln!("{}", warning(&format!("warning: {config_warning}")));
        }
    }

    if let Err(e) = config.parser_settings() {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
