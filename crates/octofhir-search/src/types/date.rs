//! Date and dateTime search.
//!
//! A search value denotes the period it covers at its own precision
//! (`2018` is the whole year). Each comparator maps onto the indexed period
//! `[DateTimeStart, DateTimeEnd]` against the value's bounds `lo` and `hi`:
//!
//! | prefix | expression |
//! |---|---|
//! | `eq` / none | `start >= lo AND end <= hi` |
//! | `ne` | `start < lo OR end > hi` |
//! | `lt` | `start < lo` |
//! | `gt` | `end > hi` |
//! | `le` | `start <= lo` |
//! | `ge` | `end >= hi` |
//! | `sa` | `start > hi` |
//! | `eb` | `end < lo` |
//! | `ap` | `eq` on the widened period |

use octofhir_core::{DateRange, FhirDateTime, parse_date_range};
use time::{Duration, OffsetDateTime, PrimitiveDateTime};

use crate::error::SearchError;
use crate::escape::unescape;
use crate::expression::{BinaryOperator, CompareValue, Expression, FieldName};
use crate::parameters::SearchPrefix;
use crate::types::{BuildContext, BuildRequest};

pub fn build(ctx: &BuildContext, request: &BuildRequest<'_>) -> Result<Expression, SearchError> {
    let text = unescape(request.value);
    let range = parse_date_range(&text).map_err(|e| request.invalid(e.detail()))?;

    let start = |op, at: OffsetDateTime| {
        Expression::binary(
            request.field(FieldName::DateTimeStart),
            op,
            CompareValue::DateTime(FhirDateTime::new(at)),
        )
    };
    let end = |op, at: OffsetDateTime| {
        Expression::binary(
            request.field(FieldName::DateTimeEnd),
            op,
            CompareValue::DateTime(FhirDateTime::new(at)),
        )
    };
    let within = |lo, hi| {
        Expression::and(vec![
            start(BinaryOperator::GreaterThanOrEqual, lo),
            end(BinaryOperator::LessThanOrEqual, hi),
        ])
    };

    let (lo, hi) = (range.start, range.end);
    let expr = match request.prefix.unwrap_or(SearchPrefix::Eq) {
        SearchPrefix::Eq => within(lo, hi),
        SearchPrefix::Ne => Expression::or(vec![
            start(BinaryOperator::LessThan, lo),
            end(BinaryOperator::GreaterThan, hi),
        ]),
        SearchPrefix::Lt => start(BinaryOperator::LessThan, lo),
        SearchPrefix::Gt => end(BinaryOperator::GreaterThan, hi),
        SearchPrefix::Le => start(BinaryOperator::LessThanOrEqual, lo),
        SearchPrefix::Ge => end(BinaryOperator::GreaterThanOrEqual, hi),
        SearchPrefix::Sa => start(BinaryOperator::GreaterThan, hi),
        SearchPrefix::Eb => end(BinaryOperator::LessThan, lo),
        SearchPrefix::Ap => {
            let (lo, hi) = approximate_bounds(ctx, &range);
            within(lo, hi)
        }
    };
    Ok(expr)
}

/// Widen `range` on both sides by the configured fraction of its distance
/// from the reference time plus the same fraction of its own length.
pub fn approximate_bounds(ctx: &BuildContext, range: &DateRange) -> (OffsetDateTime, OffsetDateTime) {
    let distance = (ctx.reference_time - range.start).abs().as_seconds_f64();
    let span = range.span().as_seconds_f64();
    let micros = (ctx.approximate_fraction * (distance + span) * 1_000_000.0).round();

    let min = PrimitiveDateTime::MIN.assume_utc();
    let max = PrimitiveDateTime::MAX.assume_utc();
    if !micros.is_finite() || micros >= i64::MAX as f64 {
        return (min, max);
    }

    let widen = Duration::microseconds(micros as i64);
    (
        range.start.checked_sub(widen).unwrap_or(min),
        range.end.checked_add(widen).unwrap_or(max),
    )
}
