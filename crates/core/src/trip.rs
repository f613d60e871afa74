use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::weekday::DayOfWeek;

/// A trip as it arrives from the input source. Every field is kept as the
/// tokenized text it was read as; nothing is validated here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RawTripRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub vendor_id: Option<String>,
    #[serde(default)]
    pub pickup_datetime: Option<String>,
    #[serde(default)]
    pub dropoff_datetime: Option<String>,
    #[serde(default)]
    pub passenger_count: Option<String>,
    #[serde(default)]
    pub pickup_longitude: Option<String>,
    #[serde(default)]
    pub pickup_latitude: Option<String>,
    #[serde(default)]
    pub dropoff_longitude: Option<String>,
    #[serde(default)]
    pub dropoff_latitude: Option<String>,
    #[serde(default)]
    pub store_and_fwd_flag: Option<String>,
    #[serde(default)]
    pub trip_duration: Option<String>,
}

/// Latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// An admitted trip: parsed input fields plus the four derived features.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DerivedTripRecord {
    pub id: Option<String>,
    pub vendor_id: Option<String>,
    pub pickup_datetime: NaiveDateTime,
    pub dropoff_datetime: NaiveDateTime,
    pub passenger_count: Option<u32>,
    pub pickup: GeoPoint,
    pub dropoff: GeoPoint,
    pub store_and_fwd_flag: Option<String>,
    pub trip_duration: i64,
    pub trip_distance_km: f64,
    pub speed_kmph: f64,
    pub pickup_hour: u8,
    pub pickup_dayofweek: DayOfWeek,
}

impl DerivedTripRecord {
    /// Derived fields are finite and inside their ranges.
    pub fn is_consistent(&self) -> bool {
        self.trip_distance_km.is_finite()
            && self.trip_distance_km >= 0.0
            && self.speed_kmph.is_finite()
            && self.speed_kmph >= 0.0
            && self.pickup_hour < 24
    }
}
