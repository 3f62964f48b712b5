//! Loading search parameter definitions from FHIR `SearchParameter` resources.
//!
//! Accepts a single SearchParameter, a JSON array of them, or a Bundle whose
//! entries contain them, and produces a [`ParameterTable`] that can replace
//! the built-in model. Resources the compiler cannot use (type `special`,
//! missing `code`/`base`/`type`) are skipped with a warning.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use octofhir_core::{ResourceType, is_valid_resource_type_name};
use serde_json::Value;
use tracing::{debug, warn};

use crate::parameters::{SearchParameterDefinition, SearchParameterType};
use crate::registry::ParameterTable;

/// Error type for search parameter loading.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The input is valid JSON but not a SearchParameter, array or Bundle
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    /// Invalid search parameter resource
    #[error("Invalid SearchParameter: {0}")]
    InvalidSearchParameter(String),
}

/// Bases that denote the Resource-level parameters every manifest already has.
const COMMON_BASES: &[&str] = &["Resource", "DomainResource"];

pub fn load_definitions_from_file(path: impl AsRef<Path>) -> Result<ParameterTable, LoaderError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| LoaderError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_definitions_from_str(&content)
}

pub fn load_definitions_from_str(input: &str) -> Result<ParameterTable, LoaderError> {
    let value: Value = serde_json::from_str(input)?;
    load_definitions_from_json(&value)
}

/// Build a registration table from SearchParameter JSON.
pub fn load_definitions_from_json(value: &Value) -> Result<ParameterTable, LoaderError> {
    let resources = collect_search_parameters(value)?;

    // Composite components refer to other parameters by canonical URL.
    let types_by_url: HashMap<&str, &str> = resources
        .iter()
        .filter_map(|resource| {
            let url = resource.get("url")?.as_str()?;
            let param_type = resource.get("type")?.as_str()?;
            Some((url, param_type))
        })
        .collect();

    let mut table = ParameterTable::new();
    let mut loaded = 0usize;
    let mut skipped = 0usize;

    for resource in &resources {
        match parse_search_parameter(resource, &types_by_url) {
            Ok(definitions) => {
                for definition in definitions {
                    table.register(definition);
                    loaded += 1;
                }
            }
            Err(e) => {
                let id = resource
                    .get("url")
                    .or_else(|| resource.get("id"))
                    .and_then(Value::as_str)
                    .unwrap_or("<unnamed>");
                warn!(resource = id, error = %e, "Skipping SearchParameter");
                skipped += 1;
            }
        }
    }

    debug!(loaded, skipped, "Loaded search parameter definitions");
    Ok(table)
}

fn collect_search_parameters(value: &Value) -> Result<Vec<&Value>, LoaderError> {
    match value {
        Value::Array(items) => Ok(items.iter().filter(|item| is_search_parameter(item)).collect()),
        Value::Object(_) => match value.get("resourceType").and_then(Value::as_str) {
            Some("SearchParameter") => Ok(vec![value]),
            Some("Bundle") => Ok(value
                .get("entry")
                .and_then(Value::as_array)
                .map(|entries| {
                    entries
                        .iter()
                        .filter_map(|entry| entry.get("resource"))
                        .filter(|resource| is_search_parameter(resource))
                        .collect()
                })
                .unwrap_or_default()),
            Some(other) => Err(LoaderError::UnsupportedInput(format!(
                "expected SearchParameter or Bundle, got {other}"
            ))),
            None => Err(LoaderError::UnsupportedInput(
                "object has no resourceType".to_string(),
            )),
        },
        _ => Err(LoaderError::UnsupportedInput(
            "expected a JSON object or array".to_string(),
        )),
    }
}

fn is_search_parameter(value: &Value) -> bool {
    value.get("resourceType").and_then(Value::as_str) == Some("SearchParameter")
}

/// Parse one SearchParameter into a definition per concrete base type.
pub fn parse_search_parameter(
    value: &Value,
    types_by_url: &HashMap<&str, &str>,
) -> Result<Vec<SearchParameterDefinition>, LoaderError> {
    let code = value
        .get("code")
        .and_then(Value::as_str)
        .filter(|code| !code.is_empty())
        .ok_or_else(|| LoaderError::InvalidSearchParameter("Missing 'code' field".into()))?;

    let type_text = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| LoaderError::InvalidSearchParameter("Missing 'type' field".into()))?;
    let param_type = SearchParameterType::parse(type_text).ok_or_else(|| {
        LoaderError::InvalidSearchParameter(format!("Unsupported type '{type_text}'"))
    })?;

    let base: Vec<&str> = string_array(value, "base");
    if base.is_empty() {
        return Err(LoaderError::InvalidSearchParameter(
            "Missing or empty 'base' field".into(),
        ));
    }

    let url = value.get("url").and_then(Value::as_str);
    let description = value.get("description").and_then(Value::as_str);

    let mut definitions = Vec::new();
    for base in base {
        if COMMON_BASES.contains(&base) {
            debug!(code, base, "Resource-level parameter covered by common parameters");
            continue;
        }
        if !is_valid_resource_type_name(base) {
            return Err(LoaderError::InvalidSearchParameter(format!(
                "Invalid base resource type '{base}'"
            )));
        }
        let resource_type = ResourceType::from_str(base)
            .map_err(|e| LoaderError::InvalidSearchParameter(e.to_string()))?;

        let mut definition = match param_type {
            SearchParameterType::Reference => SearchParameterDefinition::reference(
                resource_type,
                code,
                string_array(value, "target")
                    .into_iter()
                    .filter_map(|target| ResourceType::from_str(target).ok()),
            ),
            SearchParameterType::Composite => SearchParameterDefinition::composite(
                resource_type,
                code,
                composite_underlying_type(value, types_by_url),
            ),
            other => SearchParameterDefinition::new(resource_type, code, other),
        };
        if let Some(url) = url {
            definition = definition.with_url(url);
        }
        if let Some(description) = description {
            definition = definition.with_description(description);
        }
        definitions.push(definition);
    }
    Ok(definitions)
}

/// Type of the second component, resolved through its definition URL.
/// Falls back to token when the component cannot be resolved.
fn composite_underlying_type(
    value: &Value,
    types_by_url: &HashMap<&str, &str>,
) -> SearchParameterType {
    value
        .get("component")
        .and_then(Value::as_array)
        .and_then(|components| components.get(1))
        .and_then(|component| component.get("definition"))
        .and_then(Value::as_str)
        .and_then(|url| types_by_url.get(url))
        .and_then(|type_text| SearchParameterType::parse(type_text))
        .filter(|param_type| *param_type != SearchParameterType::Composite)
        .unwrap_or(SearchParameterType::Token)
}

fn string_array<'a>(value: &'a Value, field: &str) -> Vec<&'a str> {
    value
        .get(field)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}
