//! Implementation of `sift parse`.

use std::process::ExitCode;

use sift_query::ParsedQuery;

use crate::cli::{
    args::ParseCommand,
    context::CommandContext,
    output::{ParsedView, keyword_table, parse_results_json},
};

/// Parses each query and prints the result.
pub fn run(ctx: &CommandContext, cmd: &ParseCommand) -> ExitCode {
    let parser = match ctx.parser() {
        Ok(parser) => parser,
        Err(code) => return code,
    };

    let mut results: Vec<ParsedQuery> = Vec::with_capacity(cmd.queries.len());
    for query in &cmd.queries {
        match parser.parse(query) {
            Ok(parsed) => results.push(parsed),
            Err(e) => {
                eprintln!("error: {query:?}: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    let requested = (!cmd.namespaces.is_empty()).then_some(cmd.namespaces.as_slice());

    if cmd.json {
        return match parse_results_json(&results, requested) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: failed to serialize JSON: {e}");
                ExitCode::FAILURE
            }
        };
    }

    for (i, parsed) in results.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print!("{}", ParsedView { parsed, requested });
        if cmd.keywords
            && let Some(table) = keyword_table(parsed)
        {
            println!();
            println!("{table}");
        }
    }
    ExitCode::SUCCESS
}
