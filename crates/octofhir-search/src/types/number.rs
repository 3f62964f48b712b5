//! Number and quantity search.
//!
//! Comparator mapping:
//! - `eq` (default) / `ne`: equality / inequality
//! - `lt`, `le`, `gt`, `ge`: the matching ordering
//! - `sa` / `eb`: strictly greater / strictly less
//! - `ap`: within the configured fraction of the value
//!
//! Quantities use `number|system|code`; non-empty system and code parts
//! must match as well.

use crate::error::SearchError;
use crate::escape::{split_unescaped, unescape};
use crate::expression::{
    BinaryOperator, CompareValue, Expression, Field, FieldName, StringOperator,
};
use crate::parameters::SearchPrefix;
use crate::types::{BuildContext, BuildRequest};

pub fn build_number(
    ctx: &BuildContext,
    request: &BuildRequest<'_>,
) -> Result<Expression, SearchError> {
    let number = parse_number(request, request.value)?;
    Ok(compare(ctx, request.field(FieldName::Number), request.prefix, number))
}

pub fn build_quantity(
    ctx: &BuildContext,
    request: &BuildRequest<'_>,
) -> Result<Expression, SearchError> {
    let parts = split_unescaped(request.value, '|');
    let (number, system, code) = match parts.as_slice() {
        [number] => (*number, "", ""),
        [number, system, code] => (*number, *system, *code),
        _ => return Err(request.invalid("quantity must be 'number' or 'number|system|code'")),
    };

    let number = parse_number(request, number)?;
    let mut children = vec![compare(
        ctx,
        request.field(FieldName::Quantity),
        request.prefix,
        number,
    )];
    if !system.is_empty() {
        children.push(Expression::string(
            request.field(FieldName::QuantitySystem),
            StringOperator::Equals,
            unescape(system),
            false,
        ));
    }
    if !code.is_empty() {
        children.push(Expression::string(
            request.field(FieldName::QuantityCode),
            StringOperator::Equals,
            unescape(code),
            false,
        ));
    }
    Ok(Expression::and(children))
}

fn parse_number(request: &BuildRequest<'_>, raw: &str) -> Result<f64, SearchError> {
    let text = unescape(raw);
    match text.trim().parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(number),
        _ => Err(request.invalid(format!("'{text}' is not a number"))),
    }
}

fn compare(ctx: &BuildContext, field: Field, prefix: Option<SearchPrefix>, number: f64) -> Expression {
    let binary = |op, value| Expression::binary(field, op, CompareValue::Number(value));

    match prefix.unwrap_or(SearchPrefix::Eq) {
        SearchPrefix::Eq => binary(BinaryOperator::Equal, number),
        SearchPrefix::Ne => binary(BinaryOperator::NotEqual, number),
        SearchPrefix::Lt => binary(BinaryOperator::LessThan, number),
        SearchPrefix::Le => binary(BinaryOperator::LessThanOrEqual, number),
        SearchPrefix::Gt => binary(BinaryOperator::GreaterThan, number),
        SearchPrefix::Ge => binary(BinaryOperator::GreaterThanOrEqual, number),
        SearchPrefix::Sa => binary(BinaryOperator::GreaterThan, number),
        SearchPrefix::Eb => binary(BinaryOperator::LessThan, number),
        SearchPrefix::Ap => {
            let delta = ctx.approximate_fraction * number.abs();
            Expression::and(vec![
                binary(BinaryOperator::GreaterThanOrEqual, number - delta),
                binary(BinaryOperator::LessThanOrEqual, number + delta),
            ])
        }
    }
}
