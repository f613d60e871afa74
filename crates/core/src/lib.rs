//! Core types for Taxi Trips: raw and derived trip records, weekday encoding,
//! the exclusion log and storage rows.

pub mod exclusion;
pub mod storage;
pub mod trip;
pub mod weekday;

pub use exclusion::{ExcludedRecord, ExclusionClass, ExclusionLog, ExclusionReason, PartialFeatures};
pub use storage::{LocationRow, TripRow};
pub use trip::{DerivedTripRecord, GeoPoint, RawTripRecord};
pub use weekday::{DayOfWeek, WeekdayEncoding};

pub type TripId = u64;
pub type VendorId = u32;

#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid trip id '{0}'")]
    InvalidTripId(String),
    #[error("invalid vendor id '{0}'")]
    InvalidVendorId(String),
    #[error("unknown weekday '{0}'")]
    UnknownWeekday(String),
}
