mod cli;
mod commands;
mod config;
mod observability;
mod output;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use octofhir_search::QueryExpressionParser;

use cli::{Cli, Commands};
use output::print_error;

fn main() {
    if let Err(e) = run() {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    observability::init_tracing(&cli.log_level);

    let format = cli.format.unwrap_or_default();
    let registry = Arc::new(config::load_registry(cli.definitions.as_deref())?);

    match &cli.command {
        Commands::Compile(args) => {
            let parser = make_parser(&cli, registry)?;
            commands::compile::compile(&parser, &args.resource_type, &args.params, format)?;
        }
        Commands::CompileQuery(args) => {
            let parser = make_parser(&cli, registry)?;
            commands::compile::compile_query(&parser, &args.resource_type, &args.query, format)?;
        }
        Commands::Params(args) => {
            commands::params::params(&registry, &args.resource_type)?;
        }
    }

    Ok(())
}

fn make_parser(
    cli: &Cli,
    registry: Arc<octofhir_search::SearchParameterRegistry>,
) -> Result<QueryExpressionParser> {
    let config = config::load_compiler_config(cli.config.as_deref())?;
    Ok(QueryExpressionParser::new(registry, config))
}
