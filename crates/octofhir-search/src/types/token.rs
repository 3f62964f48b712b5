//! Token search for codes, identifiers and booleans.
//!
//! Value grammar:
//! - `code`: any system
//! - `system|code`: both must match
//! - `|code`: the code must have no system
//! - `system|`: any code within the system
//!
//! `:text` matches the display text instead, `:not` negates the default match.

use crate::error::SearchError;
use crate::escape::{split_once_unescaped, unescape};
use crate::expression::{Expression, FieldName, StringOperator};
use crate::parameters::SearchModifier;
use crate::types::BuildRequest;

pub fn build(request: &BuildRequest<'_>) -> Result<Expression, SearchError> {
    match request.modifier {
        None => build_code_match(request),
        Some(SearchModifier::Not) => Ok(Expression::not(build_code_match(request)?)),
        Some(SearchModifier::Text) => Ok(Expression::string(
            request.field(FieldName::TokenText),
            StringOperator::Contains,
            unescape(request.value),
            true,
        )),
        Some(other) => Err(request.invalid(format!("modifier ':{other}' is not supported on tokens"))),
    }
}

fn build_code_match(request: &BuildRequest<'_>) -> Result<Expression, SearchError> {
    let code = |value: &str| {
        Expression::string(
            request.field(FieldName::TokenCode),
            StringOperator::Equals,
            unescape(value),
            false,
        )
    };

    match split_once_unescaped(request.value, '|') {
        None => Ok(code(request.value)),
        Some(("", "")) => Err(request.invalid("token needs a system or a code")),
        Some(("", value)) => Ok(Expression::and(vec![
            Expression::missing(request.field(FieldName::TokenSystem)),
            code(value),
        ])),
        Some((system, value)) => {
            let mut children = vec![Expression::string(
                request.field(FieldName::TokenSystem),
                StringOperator::Equals,
                unescape(system),
                false,
            )];
            if !value.is_empty() {
                children.push(code(value));
            }
            Ok(Expression::and(children))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::{SearchParameterDefinition, SearchParameterType};
    use octofhir_core::ResourceType;

    fn code_param() -> SearchParameterDefinition {
        SearchParameterDefinition::new(ResourceType::Observation, "code", SearchParameterType::Token)
    }

    fn system(value: &str) -> Expression {
        Expression::string(FieldName::TokenSystem, StringOperator::Equals, value, false)
    }

    fn code(value: &str) -> Expression {
        Expression::string(FieldName::TokenCode, StringOperator::Equals, value, false)
    }

    #[test]
    fn test_code_only() {
        let def = code_param();
        assert_eq!(build(&BuildRequest::new(&def, "8480-6")).unwrap(), code("8480-6"));
    }

    #[test]
    fn test_system_and_code() {
        let def = code_param();
        let expr = build(&BuildRequest::new(&def, "http://loinc.org|8480-6")).unwrap();
        assert_eq!(
            expr,
            Expression::and(vec![system("http://loinc.org"), code("8480-6")])
        );
    }

    #[test]
    fn test_empty_system() {
        let def = code_param();
        let expr = build(&BuildRequest::new(&def, "|code1")).unwrap();
        assert_eq!(
            expr,
            Expression::and(vec![Expression::missing(FieldName::TokenSystem), code("code1")])
        );
    }

    #[test]
    fn test_system_only() {
        let def = code_param();
        let expr = build(&BuildRequest::new(&def, "http://loinc.org|")).unwrap();
        assert_eq!(expr, Expression::and(vec![system("http://loinc.org")]));

        assert!(build(&BuildRequest::new(&def, "|")).is_err());
    }

    #[test]
    fn test_commas_are_literal() {
        let def = code_param();
        assert_eq!(build(&BuildRequest::new(&def, "a,b")).unwrap(), code("a,b"));
    }

    #[test]
    fn test_escaped_pipe() {
        let def = code_param();
        assert_eq!(build(&BuildRequest::new(&def, r"a\|b")).unwrap(), code("a|b"));
    }

    #[test]
    fn test_text_modifier() {
        let def = code_param();
        let text = SearchModifier::Text;
        let expr = build(&BuildRequest::new(&def, "blood").with_modifier(Some(&text))).unwrap();
        assert_eq!(
            expr,
            Expression::string(FieldName::TokenText, StringOperator::Contains, "blood", true)
        );
    }

    #[test]
    fn test_not_modifier() {
        let def = code_param();
        let not = SearchModifier::Not;
        let expr = build(&BuildRequest::new(&def, "final").with_modifier(Some(&not))).unwrap();
        assert_eq!(expr, Expression::not(code("final")));
    }
}
