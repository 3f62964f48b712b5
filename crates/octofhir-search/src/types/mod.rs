//! Value expression builders, one module per search parameter type.
//!
//! Each builder turns one atomic value (already split on `,` and stripped of
//! its comparator prefix, escapes still in place) into a leaf [`Expression`]:
//! - String: case-insensitive prefix match by default, `:exact`, `:contains`
//! - Token: `system|code` split, `:text`, `:not`
//! - Uri: exact match, `:above`, `:below`
//! - Reference: reference string match, `:[type]`
//! - Number / Quantity: comparator mapped to an ordered comparison
//! - Date: comparator mapped onto the start/end of the value's period
//! - Composite: two components joined by `$`

pub mod composite;
pub mod date;
pub mod number;
pub mod reference;
pub mod string;
pub mod token;
pub mod uri;

use octofhir_core::FhirDateTime;
use time::OffsetDateTime;

use crate::config::SearchCompilerConfig;
use crate::error::SearchError;
use crate::expression::{Expression, Field, FieldName};
use crate::parameters::{
    DefinitionKind, SearchModifier, SearchParameterDefinition, SearchParameterType, SearchPrefix,
};

/// Settings the builders read, fixed for one compilation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildContext {
    pub approximate_fraction: f64,
    /// "Now" for the `ap` date comparator.
    pub reference_time: OffsetDateTime,
}

impl BuildContext {
    pub fn from_config(config: &SearchCompilerConfig) -> Self {
        Self {
            approximate_fraction: config.approximate_fraction,
            reference_time: config
                .reference_time
                .clone()
                .map(FhirDateTime::into_inner)
                .unwrap_or_else(OffsetDateTime::now_utc),
        }
    }
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::from_config(&SearchCompilerConfig::default())
    }
}

/// Everything a builder needs for one atomic value.
#[derive(Debug, Clone, Copy)]
pub struct BuildRequest<'a> {
    pub definition: &'a SearchParameterDefinition,
    pub modifier: Option<&'a SearchModifier>,
    pub prefix: Option<SearchPrefix>,
    pub value: &'a str,
    /// Composite component index; `None` outside composites.
    pub component: Option<usize>,
}

impl<'a> BuildRequest<'a> {
    pub fn new(definition: &'a SearchParameterDefinition, value: &'a str) -> Self {
        Self {
            definition,
            modifier: None,
            prefix: None,
            value,
            component: None,
        }
    }

    #[must_use]
    pub fn with_modifier(mut self, modifier: Option<&'a SearchModifier>) -> Self {
        self.modifier = modifier;
        self
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: Option<SearchPrefix>) -> Self {
        self.prefix = prefix;
        self
    }

    pub(crate) fn field(&self, name: FieldName) -> Field {
        Field::component(name, self.component)
    }

    pub(crate) fn parameter(&self) -> &str {
        &self.definition.name
    }

    pub(crate) fn invalid(&self, message: impl Into<String>) -> SearchError {
        SearchError::invalid_value(self.parameter(), message)
    }
}

/// Build the expression for one atomic value of the definition's own type.
pub fn build_value_expression(
    ctx: &BuildContext,
    request: &BuildRequest<'_>,
) -> Result<Expression, SearchError> {
    build_typed(ctx, request, request.definition.param_type())
}

/// Build with the grammar of `param_type`, which differs from the
/// definition's type for the second component of a composite.
pub(crate) fn build_typed(
    ctx: &BuildContext,
    request: &BuildRequest<'_>,
    param_type: SearchParameterType,
) -> Result<Expression, SearchError> {
    if let Some(modifier) = request.modifier {
        if *modifier == SearchModifier::Missing {
            return build_missing(request.parameter(), request.value);
        }
        if !modifier.applicable_to(param_type) {
            return Err(SearchError::InvalidModifierForType {
                modifier: modifier.clone(),
                param_type,
                parameter: request.parameter().to_string(),
            });
        }
    }
    if let Some(prefix) = request.prefix {
        // A composite passes its comparator on to the second component.
        if !param_type.supports_prefix() && param_type != SearchParameterType::Composite {
            return Err(SearchError::InvalidComparatorForType {
                prefix,
                param_type,
                parameter: request.parameter().to_string(),
            });
        }
    }

    match param_type {
        SearchParameterType::String => string::build(request),
        SearchParameterType::Token => token::build(request),
        SearchParameterType::Uri => uri::build(request),
        SearchParameterType::Reference => reference::build(request),
        SearchParameterType::Number => number::build_number(ctx, request),
        SearchParameterType::Quantity => number::build_quantity(ctx, request),
        SearchParameterType::Date => date::build(ctx, request),
        SearchParameterType::Composite => match request.definition.kind {
            DefinitionKind::Composite { underlying } => composite::build(ctx, request, underlying),
            _ => Err(request.invalid("composite grammar requires a composite definition")),
        },
    }
}

/// `param:missing=true|false`. Only the exact literals are accepted.
pub fn build_missing(parameter: &str, value: &str) -> Result<Expression, SearchError> {
    match value {
        "true" => Ok(Expression::missing_parameter(parameter, true)),
        "false" => Ok(Expression::missing_parameter(parameter, false)),
        other => Err(SearchError::InvalidMissingLiteral {
            parameter: parameter.to_string(),
            value: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use octofhir_core::ResourceType;

    fn definition(param_type: SearchParameterType) -> SearchParameterDefinition {
        SearchParameterDefinition::new(ResourceType::Patient, "p", param_type)
    }

    #[test]
    fn test_missing_literals() {
        assert_eq!(
            build_missing("gender", "true").unwrap(),
            Expression::missing_parameter("gender", true)
        );
        assert_eq!(
            build_missing("gender", "false").unwrap(),
            Expression::missing_parameter("gender", false)
        );
        for bad in ["yes", "True", "FALSE", "", " true"] {
            let err = build_missing("gender", bad).unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidMissingLiteral);
        }
    }

    #[test]
    fn test_comparator_rejected_on_unordered_types() {
        let ctx = BuildContext::default();
        for param_type in [
            SearchParameterType::String,
            SearchParameterType::Token,
            SearchParameterType::Uri,
            SearchParameterType::Reference,
        ] {
            let def = definition(param_type);
            let request = BuildRequest::new(&def, "x").with_prefix(Some(SearchPrefix::Lt));
            let err = build_value_expression(&ctx, &request).unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidComparatorForType);
        }
    }

    #[test]
    fn test_modifier_rejected_for_type() {
        let ctx = BuildContext::default();
        let def = definition(SearchParameterType::Token);
        let exact = SearchModifier::Exact;
        let request = BuildRequest::new(&def, "x").with_modifier(Some(&exact));
        let err = build_value_expression(&ctx, &request).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidModifierForType);
    }

    #[test]
    fn test_missing_modifier_through_builder() {
        let ctx = BuildContext::default();
        let def = definition(SearchParameterType::Date);
        let missing = SearchModifier::Missing;
        let request = BuildRequest::new(&def, "true").with_modifier(Some(&missing));
        assert_eq!(
            build_value_expression(&ctx, &request).unwrap(),
            Expression::missing_parameter("p", true)
        );
    }

    #[test]
    fn test_context_uses_configured_reference_time() {
        let instant = time::macros::datetime!(2020-02-02 2:02 UTC);
        let config = SearchCompilerConfig::default().with_reference_time(FhirDateTime::new(instant));
        assert_eq!(BuildContext::from_config(&config).reference_time, instant);
    }
}
