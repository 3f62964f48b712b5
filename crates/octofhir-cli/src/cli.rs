use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "octofhir")]
#[command(about = "OctoFHIR search compiler: turn FHIR search queries into expression trees")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// SearchParameter JSON (resource, array or Bundle) replacing the built-in model
    #[arg(short, long, global = true, env = "OCTOFHIR_SEARCH_DEFINITIONS")]
    pub definitions: Option<PathBuf>,

    /// Compiler config file (defaults to ~/.octofhir/search.toml when present)
    #[arg(short, long, global = true, env = "OCTOFHIR_SEARCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile key=value search parameters (conjoined with And)
    Compile(CompileArgs),
    /// Compile a URL-encoded query string (e.g. "family=Smith&_count=10")
    CompileQuery(CompileQueryArgs),
    /// List the search parameters of a resource type
    Params(ParamsArgs),
}

#[derive(clap::Args)]
pub struct CompileArgs {
    /// Resource type (e.g. Patient)
    pub resource_type: String,
    /// Search parameters as key=value (e.g. birthdate=ge2020 subject:Patient.name=peter)
    #[arg(required = true)]
    pub params: Vec<String>,
}

#[derive(clap::Args)]
pub struct CompileQueryArgs {
    /// Resource type (e.g. Patient)
    pub resource_type: String,
    /// Query string, with or without a leading '?'
    pub query: String,
}

#[derive(clap::Args)]
pub struct ParamsArgs {
    /// Resource type (e.g. Observation)
    pub resource_type: String,
}
