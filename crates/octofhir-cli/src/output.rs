use anyhow::Result;
use colored::Colorize;
use octofhir_search::{DefinitionKind, Expression, ResourceTypeManifest};
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

pub fn print_expression(expr: &Expression, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("{expr}"),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(expr)?),
    }
    Ok(())
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_manifest(manifest: &ResourceTypeManifest) {
    let mut builder = Builder::default();
    builder.push_record(["Name", "Type", "Targets / Component", "Description"]);
    for definition in manifest.iter() {
        let detail = match &definition.kind {
            DefinitionKind::Plain(_) => String::new(),
            DefinitionKind::Reference { targets } if targets.is_empty() => "Any".to_string(),
            DefinitionKind::Reference { targets } => targets
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            DefinitionKind::Composite { underlying } => format!("token $ {underlying}"),
        };
        builder.push_record([
            definition.name.clone(),
            definition.param_type().to_string(),
            detail,
            definition.description.clone().unwrap_or_default(),
        ]);
    }
    let table = builder.build().with(Style::rounded()).to_string();
    println!("{} {}", "Resource:".cyan(), manifest.resource_type().as_str().cyan());
    println!("{table}");
    println!("Total: {}", manifest.len());
}
