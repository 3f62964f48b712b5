//! URI search.
//!
//! Default is exact matching. `:below` matches URIs the value is a prefix of
//! and `:above` URIs that end the value's path; neither applies to URNs.

use crate::error::SearchError;
use crate::escape::unescape;
use crate::expression::{Expression, FieldName, StringOperator};
use crate::parameters::SearchModifier;
use crate::types::BuildRequest;

const URN_PREFIX: &str = "urn:";

pub fn build(request: &BuildRequest<'_>) -> Result<Expression, SearchError> {
    let field = request.field(FieldName::Uri);
    let value = unescape(request.value);

    let hierarchical = |op: StringOperator| {
        Expression::and(vec![
            Expression::string(field, op, value.clone(), false),
            Expression::string(field, StringOperator::NotStartsWith, URN_PREFIX, false),
        ])
    };

    match request.modifier {
        None => Ok(Expression::string(field, StringOperator::Equals, value.clone(), false)),
        Some(SearchModifier::Above) => Ok(hierarchical(StringOperator::EndsWith)),
        Some(SearchModifier::Below) => Ok(hierarchical(StringOperator::StartsWith)),
        Some(other) => Err(request.invalid(format!("modifier ':{other}' is not supported on uris"))),
    }
}
