//! String search.
//!
//! Default is a case-insensitive "starts with"; `:exact` is a case-sensitive
//! equality and `:contains` a case-insensitive substring match.

use crate::error::SearchError;
use crate::escape::unescape;
use crate::expression::{Expression, FieldName, StringOperator};
use crate::parameters::SearchModifier;
use crate::types::BuildRequest;

pub fn build(request: &BuildRequest<'_>) -> Result<Expression, SearchError> {
    let (op, ignore_case) = match request.modifier {
        None => (StringOperator::StartsWith, true),
        Some(SearchModifier::Exact) => (StringOperator::Equals, false),
        Some(SearchModifier::Contains) => (StringOperator::Contains, true),
        Some(other) => {
            return Err(request.invalid(format!("modifier ':{other}' is not supported on strings")));
        }
    };

    Ok(Expression::string(
        request.field(FieldName::String),
        op,
        unescape(request.value),
        ignore_case,
    ))
}
