//! Reference search.
//!
//! Values are matched as reference strings: `Patient/123`, a bare id, or an
//! absolute URL. The type modifier (`subject:Patient=123`) qualifies a bare
//! id with the resource type.

use crate::error::SearchError;
use crate::escape::unescape;
use crate::expression::{Expression, FieldName, StringOperator};
use crate::parameters::SearchModifier;
use crate::types::BuildRequest;

pub fn build(request: &BuildRequest<'_>) -> Result<Expression, SearchError> {
    let value = unescape(request.value);
    let reference = match request.modifier {
        None => value,
        Some(SearchModifier::Type(resource_type)) => {
            if !request.definition.targets_type(resource_type) {
                return Err(SearchError::UnsupportedTargetType {
                    parameter: request.parameter().to_string(),
                    target: resource_type.to_string(),
                });
            }
            if value.contains('/') {
                value
            } else {
                format!("{resource_type}/{value}")
            }
        }
        Some(other) => {
            return Err(request.invalid(format!(
                "modifier ':{other}' is not supported on references"
            )));
        }
    };

    Ok(Expression::string(
        request.field(FieldName::Reference),
        StringOperator::Equals,
        reference,
        false,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::parameters::SearchParameterDefinition;
    use octofhir_core::ResourceType;

    fn subject() -> SearchParameterDefinition {
        SearchParameterDefinition::reference(
            ResourceType::Observation,
            "subject",
            [ResourceType::Patient, ResourceType::Group],
        )
    }

    fn reference(value: &str) -> Expression {
        Expression::string(FieldName::Reference, StringOperator::Equals, value, false)
    }

    #[test]
    fn test_plain_reference() {
        let def = subject();
        assert_eq!(
            build(&BuildRequest::new(&def, "Patient/123")).unwrap(),
            reference("Patient/123")
        );
    }

    #[test]
    fn test_type_modifier_qualifies_id() {
        let def = subject();
        let patient = SearchModifier::Type(ResourceType::Patient);
        let expr = build(&BuildRequest::new(&def, "123").with_modifier(Some(&patient))).unwrap();
        assert_eq!(expr, reference("Patient/123"));

        let expr = build(&BuildRequest::new(&def, "Patient/9").with_modifier(Some(&patient))).unwrap();
        assert_eq!(expr, reference("Patient/9"));
    }

    #[test]
    fn test_type_modifier_must_be_a_target() {
        let def = subject();
        let device = SearchModifier::Type(ResourceType::Device);
        let err = build(&BuildRequest::new(&def, "1").with_modifier(Some(&device))).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedTargetType);
    }
}
