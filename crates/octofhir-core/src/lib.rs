pub mod error;
pub mod fhir;
pub mod time;

pub use error::{CoreError, Result};
pub use fhir::{ResourceType, is_valid_resource_type_name};
pub use self::time::{DatePrecision, DateRange, FhirDateTime, now_utc, parse_date_range};
