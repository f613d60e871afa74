//! Row shapes for the `trips`, `locations` and `vendors` tables.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::trip::DerivedTripRecord;
use crate::weekday::WeekdayEncoding;
use crate::{CoreError, TripId, VendorId};

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TripRow {
    pub trip_id: TripId,
    pub vendor_id: Option<VendorId>,
    pub pickup_datetime: String,
    pub dropoff_datetime: String,
    pub passenger_count: Option<u32>,
    pub store_and_fwd_flag: Option<char>,
    pub trip_duration: i64,
    pub trip_distance_km: f64,
    pub speed_kmph: f64,
    pub pickup_hour: u8,
    pub pickup_dayofweek: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationRow {
    pub trip_id: TripId,
    pub pickup_longitude: f64,
    pub pickup_latitude: f64,
    pub dropoff_longitude: f64,
    pub dropoff_latitude: f64,
}

/// Strip the `id` prefix from identifiers like `id2875421`.
pub fn parse_trip_id(raw: &str) -> Result<TripId, CoreError> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix("id").unwrap_or(trimmed).trim();
    digits
        .parse::<TripId>()
        .map_err(|_| CoreError::InvalidTripId(raw.to_string()))
}

/// Round to the two decimal places of a `DECIMAL(10,2)` column.
pub fn round_decimal2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl TripRow {
    pub fn from_derived(
        record: &DerivedTripRecord,
        encoding: WeekdayEncoding,
    ) -> Result<Self, CoreError> {
        let trip_id = record
            .id
            .as_deref()
            .ok_or_else(|| CoreError::InvalidTripId(String::new()))
            .and_then(parse_trip_id)?;
        let vendor_id = record
            .vendor_id
            .as_deref()
            .map(|v| {
                v.trim()
                    .parse::<VendorId>()
                    .map_err(|_| CoreError::InvalidVendorId(v.to_string()))
            })
            .transpose()?;

        Ok(Self {
            trip_id,
            vendor_id,
            pickup_datetime: record.pickup_datetime.format(DATETIME_FORMAT).to_string(),
            dropoff_datetime: record.dropoff_datetime.format(DATETIME_FORMAT).to_string(),
            passenger_count: record.passenger_count,
            store_and_fwd_flag: record
                .store_and_fwd_flag
                .as_deref()
                .and_then(|flag| flag.trim().chars().next()),
            trip_duration: record.trip_duration,
            trip_distance_km: round_decimal2(record.trip_distance_km),
            speed_kmph: round_decimal2(record.speed_kmph),
            pickup_hour: record.pickup_hour,
            pickup_dayofweek: record.pickup_dayofweek.encode(encoding),
        })
    }
}

impl LocationRow {
    pub fn from_derived(record: &DerivedTripRecord, trip_id: TripId) -> Self {
        Self {
            trip_id,
            pickup_longitude: record.pickup.longitude,
            pickup_latitude: record.pickup.latitude,
            dropoff_longitude: record.dropoff.longitude,
            dropoff_latitude: record.dropoff.latitude,
        }
    }
}

/// Distinct vendor ids referenced by a set of trip rows, ascending.
pub fn distinct_vendors(rows: &[TripRow]) -> Vec<VendorId> {
    rows.iter()
        .filter_map(|row| row.vendor_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
