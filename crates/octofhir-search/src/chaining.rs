//! Chained parameters.
//!
//! `subject.name=peter` resolves `subject` on the source type, then compiles
//! `name=peter` against every resource type the reference may point at and
//! combines the per-target results with `Or`. `subject:Patient.name=peter`
//! restricts the fan-out to one target.
//!
//! Without a scope, targets that lack the nested parameter are skipped; the
//! chain fails only when no target is left. A scoped chain reports the nested
//! error as is.

use std::str::FromStr;

use octofhir_core::{ResourceType, is_valid_resource_type_name};

use crate::error::SearchError;
use crate::expression::Expression;
use crate::parser::{QueryExpressionParser, split_name_and_modifier};
use crate::registry::ResourceTypeManifest;
use crate::types::BuildContext;

pub(crate) fn parse_chain(
    parser: &QueryExpressionParser,
    ctx: &BuildContext,
    manifest: &ResourceTypeManifest,
    head: &str,
    nested_key: &str,
    value: &str,
) -> Result<Expression, SearchError> {
    let (name, scope) = split_name_and_modifier(head)?;
    let scope = scope.map(|text| parse_scope(head, text)).transpose()?;

    let definition = manifest
        .get(name)
        .ok_or_else(|| SearchError::unknown_parameter(name, manifest.resource_type().as_str()))?;
    let Some(targets) = definition.targets() else {
        return Err(SearchError::ChainRequiresReference {
            parameter: name.to_string(),
            resource_type: manifest.resource_type().to_string(),
        });
    };
    let source_type = manifest.resource_type().clone();

    let nested_name = nested_parameter_name(nested_key);

    if let Some(target) = scope {
        let unsupported = || SearchError::UnsupportedTargetType {
            parameter: name.to_string(),
            target: target.to_string(),
        };
        if !definition.targets_type(&target) {
            return Err(unsupported());
        }
        // A declared target the registry cannot describe is unsupported too.
        let target_manifest = parser.manifest_for(&target).map_err(|_| unsupported())?;
        if !target_manifest.contains(nested_name) {
            return Err(unsupported());
        }
        let inner = parser.parse_key(ctx, &target_manifest, nested_key, value)?;
        return Ok(Expression::or(vec![Expression::chained(
            source_type,
            name,
            target,
            inner,
        )]));
    }

    let candidates: Vec<ResourceType> = if targets.is_empty() {
        parser.registry().resource_types()
    } else {
        targets.iter().cloned().collect()
    };

    let mut children = Vec::new();
    for target in candidates {
        let Ok(target_manifest) = parser.manifest_for(&target) else {
            tracing::debug!(
                parameter = name,
                target = %target,
                "Skipping chain target unknown to the registry"
            );
            continue;
        };
        if !target_manifest.contains(nested_name) {
            tracing::debug!(
                parameter = name,
                target = %target,
                nested = nested_name,
                "Skipping chain target without the nested parameter"
            );
            continue;
        }
        let inner = parser.parse_key(ctx, &target_manifest, nested_key, value)?;
        children.push(Expression::chained(source_type.clone(), name, target, inner));
    }

    if children.is_empty() {
        return Err(SearchError::NoChainTarget {
            parameter: name.to_string(),
            chained: nested_name.to_string(),
        });
    }
    Ok(Expression::or(children))
}

fn parse_scope(head: &str, text: &str) -> Result<ResourceType, SearchError> {
    if !is_valid_resource_type_name(text) {
        return Err(SearchError::malformed_key(
            head,
            format!("':{text}' is not a resource type; modifiers cannot be chained"),
        ));
    }
    ResourceType::from_str(text).map_err(|e| SearchError::malformed_key(head, e.to_string()))
}

/// Name of the first parameter in a nested key: `name` in `name:exact` or `org.name`.
fn nested_parameter_name(nested_key: &str) -> &str {
    let segment = nested_key.split('.').next().unwrap_or(nested_key);
    segment.split(':').next().unwrap_or(segment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchCompilerConfig;
    use crate::error::ErrorCode;
    use crate::expression::{FieldName, StringOperator};
    use crate::parameters::{SearchParameterDefinition, SearchParameterType};
    use crate::registry::{ParameterTable, SearchParameterRegistry};
    use std::sync::Arc;

    fn parser() -> QueryExpressionParser {
        QueryExpressionParser::new(
            Arc::new(SearchParameterRegistry::with_builtin()),
            SearchCompilerConfig::default(),
        )
    }

    fn name_starts_with(value: &str) -> Expression {
        Expression::string(FieldName::String, StringOperator::StartsWith, value, true)
    }

    #[test]
    fn test_nested_parameter_name() {
        assert_eq!(nested_parameter_name("name"), "name");
        assert_eq!(nested_parameter_name("name:exact"), "name");
        assert_eq!(nested_parameter_name("organization:Organization.name"), "organization");
    }

    #[test]
    fn test_fan_out_skips_targets_without_parameter() {
        // Encounter.subject targets Patient and Group; only Patient has `family`.
        let expr = parser()
            .parse_for_type("Encounter", "subject.family", "Smith")
            .unwrap();
        assert_eq!(
            expr,
            Expression::or(vec![Expression::chained(
                ResourceType::Encounter,
                "subject",
                ResourceType::Patient,
                name_starts_with("Smith"),
            )])
        );
    }

    #[test]
    fn test_fan_out_skips_unknown_targets() {
        // Patient.general-practitioner also targets PractitionerRole, which the
        // built-in model does not define.
        let expr = parser()
            .parse_for_type("Patient", "general-practitioner.name", "Ann")
            .unwrap();
        let Expression::Multiary { children, .. } = expr else {
            panic!("expected Or");
        };
        let targets: Vec<_> = children
            .iter()
            .map(|child| match child {
                Expression::Chained { target_type, .. } => target_type.clone(),
                other => panic!("unexpected {other}"),
            })
            .collect();
        assert_eq!(targets, vec![ResourceType::Organization, ResourceType::Practitioner]);
    }

    #[test]
    fn test_no_target_has_parameter() {
        let err = parser()
            .parse_for_type("Encounter", "subject.shoe-size", "9")
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedTargetType);
    }

    #[test]
    fn test_scoped_chain_errors() {
        let parser = parser();
        let err = parser
            .parse_for_type("Encounter", "subject:Device.name", "x")
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedTargetType);

        let err = parser
            .parse_for_type("Encounter", "subject:Group.family", "x")
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedTargetType);

        // Errors past the nested parameter name still surface as they are.
        let err = parser
            .parse_for_type("Encounter", "subject:Patient.gender:exact", "x")
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidModifierForType);

        let err = parser
            .parse_for_type("Encounter", "subject:exact.family", "x")
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::MalformedModifierSyntax);
    }

    #[test]
    fn test_scoped_chain_to_target_unknown_to_registry() {
        let err = parser()
            .parse_for_type("Patient", "general-practitioner:PractitionerRole.name", "x")
            .unwrap_err();
        assert!(matches!(
            &err,
            SearchError::UnsupportedTargetType { parameter, target }
                if parameter == "general-practitioner" && target == "PractitionerRole"
        ));
    }

    #[test]
    fn test_chain_requires_reference() {
        let err = parser()
            .parse_for_type("Patient", "name.family", "x")
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ChainRequiresReference);
    }

    #[test]
    fn test_untargeted_reference_fans_out_sorted() {
        let table: ParameterTable = [
            SearchParameterDefinition::new(ResourceType::Observation, "focus", SearchParameterType::Reference),
            SearchParameterDefinition::new(ResourceType::Practitioner, "name", SearchParameterType::String),
            SearchParameterDefinition::new(ResourceType::Device, "name", SearchParameterType::String),
        ]
        .into_iter()
        .collect();
        let parser = QueryExpressionParser::new(
            Arc::new(SearchParameterRegistry::new(table)),
            SearchCompilerConfig::default(),
        );

        let expr = parser.parse_for_type("Observation", "focus.name", "a").unwrap();
        assert_eq!(
            expr,
            Expression::or(vec![
                Expression::chained(
                    ResourceType::Observation,
                    "focus",
                    ResourceType::Device,
                    name_starts_with("a")
                ),
                Expression::chained(
                    ResourceType::Observation,
                    "focus",
                    ResourceType::Practitioner,
                    name_starts_with("a")
                ),
            ])
        );
    }

    #[test]
    fn test_multi_hop_chain() {
        let expr = parser()
            .parse_for_type("Observation", "encounter.service-provider.name", "Acme")
            .unwrap();
        assert_eq!(
            expr,
            Expression::or(vec![Expression::chained(
                ResourceType::Observation,
                "encounter",
                ResourceType::Encounter,
                Expression::or(vec![Expression::chained(
                    ResourceType::Encounter,
                    "service-provider",
                    ResourceType::Organization,
                    name_starts_with("Acme"),
                )]),
            )])
        );
    }
}
