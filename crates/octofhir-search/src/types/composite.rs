//! Composite search.
//!
//! A composite value joins two components with `$`, e.g.
//! `http://loinc.org|8480-6$lt60`. The first component is a token; the
//! second uses the parameter's underlying type and may carry its own
//! comparator when that type is ordered. Both must match, so the result is
//! `And(component0, component1)`.

use crate::error::SearchError;
use crate::escape::split_once_unescaped;
use crate::expression::Expression;
use crate::parameters::{SearchParameterType, SearchPrefix};
use crate::types::{BuildContext, BuildRequest, build_typed};

pub fn build(
    ctx: &BuildContext,
    request: &BuildRequest<'_>,
    underlying: SearchParameterType,
) -> Result<Expression, SearchError> {
    if underlying == SearchParameterType::Composite {
        return Err(request.invalid("composite components cannot be composite"));
    }

    let (first, second) = split_once_unescaped(request.value, '$')
        .ok_or_else(|| request.invalid("composite value needs two components joined by '$'"))?;
    if first.is_empty() || second.is_empty() {
        return Err(request.invalid("composite components must not be empty"));
    }

    let code = build_typed(
        ctx,
        &BuildRequest {
            definition: request.definition,
            modifier: None,
            prefix: None,
            value: first,
            component: Some(0),
        },
        SearchParameterType::Token,
    )?;

    let (prefix, second) = match request.prefix {
        Some(prefix) => (Some(prefix), second),
        None if underlying.supports_prefix() => SearchPrefix::extract(second),
        None => (None, second),
    };
    let value = build_typed(
        ctx,
        &BuildRequest {
            definition: request.definition,
            modifier: None,
            prefix,
            value: second,
            component: Some(1),
        },
        underlying,
    )?;

    Ok(Expression::and(vec![code, value]))
}
