use anyhow::{Context, Result};
use octofhir_search::{Expression, QueryExpressionParser};

use crate::cli::OutputFormat;
use crate::output::print_expression;

pub fn compile(
    parser: &QueryExpressionParser,
    resource_type: &str,
    raw_params: &[String],
    format: OutputFormat,
) -> Result<()> {
    let manifest = parser.registry().get_manifest_by_name(resource_type)?;

    let mut children = Vec::with_capacity(raw_params.len());
    for raw in raw_params {
        let (key, value) = split_pair(raw)?;
        let expr = parser
            .parse(&manifest, key, value)
            .with_context(|| format!("Cannot compile '{raw}'"))?;
        children.push(expr);
    }

    print_expression(&Expression::and(children), format)
}

pub fn compile_query(
    parser: &QueryExpressionParser,
    resource_type: &str,
    query: &str,
    format: OutputFormat,
) -> Result<()> {
    match parser.parse_query(resource_type, query)? {
        Some(expr) => print_expression(&expr, format),
        None => {
            eprintln!("No search criteria in query.");
            Ok(())
        }
    }
}

fn split_pair(raw: &str) -> Result<(&str, &str)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => anyhow::bail!("Expected key=value, got '{raw}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_first_equals() {
        assert_eq!(split_pair("name=a=b").unwrap(), ("name", "a=b"));
        assert_eq!(split_pair("gender:missing=true").unwrap(), ("gender:missing", "true"));
        assert!(split_pair("name").is_err());
        assert!(split_pair("=x").is_err());
    }
}
