//! Clap argument definitions for the `sift` CLI.

use clap::{ArgAction, Args, Parser, Subcommand};

/// Top-level CLI options.
#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Inspect how search query strings are parsed")]
pub struct Cli {
    /// Log verbosity (-v for debug, -vv for trace). SIFT_LOG overrides this.
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Supported `sift` subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Parse queries and show the resulting tree
    Parse(ParseCommand),

    /// Show discovered config files and effective settings
    Config,

    /// Initialize sift configuration in the current directory
    Init(InitCommand),
}

/// Arguments for `sift parse`.
#[derive(Args, Debug, Clone)]
pub struct ParseCommand {
    /// Queries to parse
    #[arg(required = true)]
    pub queries: Vec<String>,

    /// Output the parsed query as JSON
    #[arg(long)]
    pub json: bool,

    /// Show a table of matched keywords
    #[arg(short = 'k', long)]
    pub keywords: bool,

    /// Namespace ids the search was requested in (can be specified multiple times)
    #[arg(short = 'n', long = "namespace")]
    pub namespaces: Vec<i32>,
}

/// Arguments for `sift init`.
#[derive(Args, Debug, Clone)]
pub struct InitCommand {
    /// Create global ~/.sift.toml instead
    #[arg(long)]
    pub global: bool,

    /// Overwrite existing configuration file
    #[arg(long)]
    pub force: bool,
}
