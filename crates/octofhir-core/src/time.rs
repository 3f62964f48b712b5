//! FHIR date/dateTime handling.
//!
//! Search values may be partial dates. Each one denotes the closed range of
//! instants it covers at its own precision:
//! - Year: `2023` -> [2023-01-01T00:00:00Z, 2023-12-31T23:59:59.999999Z]
//! - Month: `2023-01` -> the whole of January
//! - Day: `2023-01-15` -> the whole day
//! - Minute / second: `2023-01-15T10:30[:00]` -> that minute / second
//! - Fractional seconds: a single instant (microsecond resolution)
//!
//! Values without an offset are interpreted as UTC.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FhirDateTime(pub OffsetDateTime);

impl FhirDateTime {
    pub fn new(datetime: OffsetDateTime) -> Self {
        Self(datetime)
    }

    pub fn inner(&self) -> &OffsetDateTime {
        &self.0
    }

    pub fn into_inner(self) -> OffsetDateTime {
        self.0
    }
}

impl fmt::Display for FhirDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = self
            .0
            .format(&time::format_description::well_known::Rfc3339)
            .map_err(|_| fmt::Error)?;
        write!(f, "{formatted}")
    }
}

impl FromStr for FhirDateTime {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let datetime = OffsetDateTime::parse(s, &time::format_description::well_known::Rfc3339)
            .map_err(|e| {
                CoreError::invalid_date_time(format!("Failed to parse FHIR DateTime '{s}': {e}"))
            })?;
        Ok(FhirDateTime(datetime))
    }
}

impl Serialize for FhirDateTime {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = self
            .0
            .format(&time::format_description::well_known::Rfc3339)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }
}

impl<'de> Deserialize<'de> for FhirDateTime {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FhirDateTime::from_str(&s).map_err(serde::de::Error::custom)
    }
}

pub fn now_utc() -> FhirDateTime {
    FhirDateTime(OffsetDateTime::now_utc())
}

/// Precision a partial date was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePrecision {
    Year,
    Month,
    Day,
    Minute,
    Second,
    Fraction,
}

/// Closed instant range covered by a partial date, both bounds in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
    pub precision: DatePrecision,
}

impl DateRange {
    /// Length of the range, counting the final microsecond.
    pub fn span(&self) -> Duration {
        self.end - self.start + Duration::MICROSECOND
    }
}

/// Parse a FHIR date, partial date or dateTime into the range it covers.
pub fn parse_date_range(input: &str) -> Result<DateRange> {
    let trimmed = input.trim();
    let invalid = || CoreError::invalid_date_time(format!("'{trimmed}' is not a valid FHIR date"));

    let (date_part, time_part) = match trimmed.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (trimmed, None),
    };

    let fields: Vec<&str> = date_part.split('-').collect();
    if fields.len() > 3 || (time_part.is_some() && fields.len() != 3) {
        return Err(invalid());
    }

    let year = parse_digits(fields[0], 4).ok_or_else(invalid)? as i32;
    let month = match fields.get(1) {
        Some(field) => {
            let number = parse_digits(field, 2).ok_or_else(invalid)?;
            Some(Month::try_from(number as u8).map_err(|_| invalid())?)
        }
        None => None,
    };
    let day = match fields.get(2) {
        Some(field) => Some(parse_digits(field, 2).ok_or_else(invalid)? as u8),
        None => None,
    };

    let (start, next, precision) = match (month, day, time_part) {
        (None, _, _) => {
            let start = calendar_start(year, Month::January, 1).ok_or_else(invalid)?;
            (start, calendar_start(year + 1, Month::January, 1), DatePrecision::Year)
        }
        (Some(month), None, _) => {
            let start = calendar_start(year, month, 1).ok_or_else(invalid)?;
            let next_year = if month == Month::December { year + 1 } else { year };
            (start, calendar_start(next_year, month.next(), 1), DatePrecision::Month)
        }
        (Some(month), Some(day), None) => {
            let start = calendar_start(year, month, day).ok_or_else(invalid)?;
            (start, start.checked_add(Duration::DAY), DatePrecision::Day)
        }
        (Some(month), Some(day), Some(clock)) => {
            let date = Date::from_calendar_date(year, month, day).map_err(|_| invalid())?;
            let (time, offset, precision) = parse_clock(clock).ok_or_else(invalid)?;
            let start = to_utc_clamped(PrimitiveDateTime::new(date, time), offset);
            let step = match precision {
                DatePrecision::Minute => Duration::MINUTE,
                DatePrecision::Second => Duration::SECOND,
                _ => Duration::MICROSECOND,
            };
            (start, start.checked_add(step), precision)
        }
    };

    // The last representable instant closes ranges that run past year 9999.
    let end = match next {
        Some(next) => next - Duration::MICROSECOND,
        None => PrimitiveDateTime::MAX.assume_utc(),
    };

    Ok(DateRange {
        start,
        end,
        precision,
    })
}

/// Normalize a local time to UTC. Instants its offset pushes outside the
/// representable years are clamped to the nearest bound.
fn to_utc_clamped(local: PrimitiveDateTime, offset: UtcOffset) -> OffsetDateTime {
    match local.assume_offset(offset).checked_to_offset(UtcOffset::UTC) {
        Some(utc) => utc,
        None if offset.is_negative() => PrimitiveDateTime::MAX.assume_utc(),
        None => PrimitiveDateTime::MIN.assume_utc(),
    }
}

fn calendar_start(year: i32, month: Month, day: u8) -> Option<OffsetDateTime> {
    Date::from_calendar_date(year, month, day)
        .ok()
        .map(|date| date.with_time(Time::MIDNIGHT).assume_utc())
}

/// Parse `hh:mm[:ss[.fff]][Z|(+|-)hh:mm]`.
fn parse_clock(clock: &str) -> Option<(Time, UtcOffset, DatePrecision)> {
    let (clock, offset) = if let Some(rest) = clock.strip_suffix('Z') {
        (rest, UtcOffset::UTC)
    } else if let Some(pos) = clock.rfind(|c: char| c == '+' || c == '-') {
        (&clock[..pos], parse_offset(&clock[pos..])?)
    } else {
        (clock, UtcOffset::UTC)
    };

    let fields: Vec<&str> = clock.split(':').collect();
    if fields.len() < 2 || fields.len() > 3 {
        return None;
    }

    let hour = parse_digits(fields[0], 2)? as u8;
    let minute = parse_digits(fields[1], 2)? as u8;
    let (second, micro, precision) = match fields.get(2) {
        None => (0, 0, DatePrecision::Minute),
        Some(field) => match field.split_once('.') {
            None => (parse_digits(field, 2)? as u8, 0, DatePrecision::Second),
            Some((whole, fraction)) => {
                if fraction.is_empty() || !fraction.chars().all(|c| c.is_ascii_digit()) {
                    return None;
                }
                let micro_digits: String = fraction.chars().chain("000000".chars()).take(6).collect();
                let micro = micro_digits.parse::<u32>().ok()?;
                (parse_digits(whole, 2)? as u8, micro, DatePrecision::Fraction)
            }
        },
    };

    let time = Time::from_hms_micro(hour, minute, second, micro).ok()?;
    Some((time, offset, precision))
}

fn parse_offset(offset: &str) -> Option<UtcOffset> {
    let sign: i8 = if offset.starts_with('-') { -1 } else { 1 };
    let (hours, minutes) = offset[1..].split_once(':')?;
    let hours = parse_digits(hours, 2)? as i8;
    let minutes = parse_digits(minutes, 2)? as i8;
    UtcOffset::from_hms(sign * hours, sign * minutes, 0).ok()
}

fn parse_digits(field: &str, width: usize) -> Option<u32> {
    if field.len() != width || !field.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}
