//! Value parsing: resolves the modifier, comparator prefix and comma
//! alternation of one raw parameter value, then hands each atomic value to
//! the type's builder.

use crate::error::SearchError;
use crate::escape::split_unescaped;
use crate::expression::Expression;
use crate::parameters::{SearchModifier, SearchParameterDefinition, SearchParameterType, SearchPrefix};
use crate::types::{BuildContext, BuildRequest, build_missing, build_value_expression};

/// Compile `raw_value` for `definition` with an optional modifier code
/// (the text after `:` in the key).
///
/// Multiple comma-separated values become an `Or` in the order given.
pub fn parse_value(
    ctx: &BuildContext,
    definition: &SearchParameterDefinition,
    modifier_text: Option<&str>,
    raw_value: &str,
) -> Result<Expression, SearchError> {
    let modifier = match modifier_text {
        Some("missing") => return build_missing(&definition.name, raw_value),
        Some(text) => Some(resolve_modifier(definition, text)?),
        None => None,
    };

    if raw_value.is_empty() {
        return Err(SearchError::invalid_value(&definition.name, "value must not be empty"));
    }

    let param_type = definition.param_type();
    let request = BuildRequest::new(definition, raw_value).with_modifier(modifier.as_ref());

    // Composite and token values are handed over whole.
    if matches!(
        param_type,
        SearchParameterType::Composite | SearchParameterType::Token
    ) {
        return build_value_expression(ctx, &request);
    }

    let (prefix, remainder) = if param_type.supports_prefix() {
        SearchPrefix::extract(raw_value)
    } else {
        (None, raw_value)
    };

    let candidates = split_unescaped(remainder, ',');
    if candidates.len() > 1
        && let Some(prefix) = prefix.filter(|p| *p != SearchPrefix::Eq)
    {
        return Err(SearchError::MultiValueWithComparator {
            parameter: definition.name.clone(),
            prefix,
        });
    }

    let mut children = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if candidate.is_empty() {
            return Err(SearchError::invalid_value(
                &definition.name,
                "empty value in comma-separated list",
            ));
        }
        let request = BuildRequest {
            value: candidate,
            prefix,
            ..request
        };
        children.push(build_value_expression(ctx, &request)?);
    }

    match children.len() {
        1 => Ok(children.remove(0)),
        _ => Ok(Expression::or(children)),
    }
}

fn resolve_modifier(
    definition: &SearchParameterDefinition,
    text: &str,
) -> Result<SearchModifier, SearchError> {
    let modifier = SearchModifier::parse(text).ok_or_else(|| SearchError::UnknownModifier {
        modifier: text.to_string(),
    })?;

    let param_type = definition.param_type();
    if !modifier.applicable_to(param_type) {
        return Err(SearchError::InvalidModifierForType {
            modifier,
            param_type,
            parameter: definition.name.clone(),
        });
    }
    if let SearchModifier::Type(target) = &modifier
        && !definition.targets_type(target)
    {
        return Err(SearchError::UnsupportedTargetType {
            parameter: definition.name.clone(),
            target: target.to_string(),
        });
    }
    Ok(modifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::expression::{BinaryOperator, CompareValue, FieldName, StringOperator};
    use octofhir_core::ResourceType;

    fn def(name: &str, param_type: SearchParameterType) -> SearchParameterDefinition {
        SearchParameterDefinition::new(ResourceType::Patient, name, param_type)
    }

    fn starts_with(value: &str) -> Expression {
        Expression::string(FieldName::String, StringOperator::StartsWith, value, true)
    }

    #[test]
    fn test_single_value_is_not_wrapped() {
        let ctx = BuildContext::default();
        let family = def("family", SearchParameterType::String);
        assert_eq!(parse_value(&ctx, &family, None, "Smith").unwrap(), starts_with("Smith"));
    }

    #[test]
    fn test_multi_value_or() {
        let ctx = BuildContext::default();
        let family = def("family", SearchParameterType::String);
        assert_eq!(
            parse_value(&ctx, &family, None, "Smith,Jones").unwrap(),
            Expression::or(vec![starts_with("Smith"), starts_with("Jones")])
        );
        assert_eq!(
            parse_value(&ctx, &family, None, r"Smith\,Jones").unwrap(),
            starts_with("Smith,Jones")
        );
    }

    #[test]
    fn test_string_prefix_is_literal() {
        let ctx = BuildContext::default();
        let family = def("family", SearchParameterType::String);
        assert_eq!(parse_value(&ctx, &family, None, "ltSmith").unwrap(), starts_with("ltSmith"));
    }

    #[test]
    fn test_prefix_with_multiple_values() {
        let ctx = BuildContext::default();
        let length = def("length", SearchParameterType::Number);

        let err = parse_value(&ctx, &length, None, "gt1,2").unwrap_err();
        assert_eq!(err.code(), ErrorCode::MultiValueWithComparator);

        let expr = parse_value(&ctx, &length, None, "eq1,2").unwrap();
        assert_eq!(
            expr,
            Expression::or(vec![
                Expression::binary(FieldName::Number, BinaryOperator::Equal, CompareValue::Number(1.0)),
                Expression::binary(FieldName::Number, BinaryOperator::Equal, CompareValue::Number(2.0)),
            ])
        );
    }

    #[test]
    fn test_missing_short_circuits() {
        let ctx = BuildContext::default();
        let gender = def("gender", SearchParameterType::Token);
        assert_eq!(
            parse_value(&ctx, &gender, Some("missing"), "true").unwrap(),
            Expression::missing_parameter("gender", true)
        );
        let err = parse_value(&ctx, &gender, Some("missing"), "yes").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidMissingLiteral);
    }

    #[test]
    fn test_modifier_validation() {
        let ctx = BuildContext::default();
        let gender = def("gender", SearchParameterType::Token);
        let err = parse_value(&ctx, &gender, Some("exact"), "male").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidModifierForType);

        let err = parse_value(&ctx, &gender, Some("bogus"), "male").unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnknownModifier);

        let name = def("name", SearchParameterType::String);
        let err = parse_value(&ctx, &name, Some("above"), "x").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidModifierForType);

        let err = parse_value(&ctx, &name, Some("in"), "x").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidModifierForType);
    }

    #[test]
    fn test_type_modifier_checked_against_targets() {
        let ctx = BuildContext::default();
        let subject = SearchParameterDefinition::reference(
            ResourceType::Observation,
            "subject",
            [ResourceType::Patient],
        );
        let err = parse_value(&ctx, &subject, Some("Device"), "1").unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedTargetType);

        let expr = parse_value(&ctx, &subject, Some("Patient"), "1,2").unwrap();
        assert_eq!(
            expr,
            Expression::or(vec![
                Expression::string(FieldName::Reference, StringOperator::Equals, "Patient/1", false),
                Expression::string(FieldName::Reference, StringOperator::Equals, "Patient/2", false),
            ])
        );
    }

    #[test]
    fn test_empty_values_rejected() {
        let ctx = BuildContext::default();
        let family = def("family", SearchParameterType::String);
        for bad in ["", "a,", ",a"] {
            let err = parse_value(&ctx, &family, None, bad).unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidSearchValue, "value {bad:?}");
        }
    }
}
