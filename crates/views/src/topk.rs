//! Bounded top-K selection by a numeric trip field.
//!
//! The working list is kept sorted descending and never grows past `k`. A new
//! value is inserted in front of the first strictly smaller entry, so an
//! arrival that ties with existing entries lands behind them and earlier
//! records win ties.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;
use tt_core::DerivedTripRecord;

use crate::TopKConfig;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectError {
    #[error("k must be at least 1, got {0}")]
    InvalidK(usize),
    #[error("unknown ranking field '{0}'")]
    UnknownField(String),
    #[error("field '{0}' is not numeric and cannot be ranked")]
    NotNumeric(String),
    #[error("record {index} has no value for '{field}'")]
    MissingField { field: RankField, index: usize },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RankField {
    TripDistanceKm,
    SpeedKmph,
    TripDuration,
    PickupHour,
    PassengerCount,
}

const NON_NUMERIC_FIELDS: [&str; 6] = [
    "id",
    "vendor_id",
    "pickup_datetime",
    "dropoff_datetime",
    "store_and_fwd_flag",
    "pickup_dayofweek",
];

impl RankField {
    pub const ALL: [RankField; 5] = [
        RankField::TripDistanceKm,
        RankField::SpeedKmph,
        RankField::TripDuration,
        RankField::PickupHour,
        RankField::PassengerCount,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RankField::TripDistanceKm => "trip_distance_km",
            RankField::SpeedKmph => "speed_kmph",
            RankField::TripDuration => "trip_duration",
            RankField::PickupHour => "pickup_hour",
            RankField::PassengerCount => "passenger_count",
        }
    }

    pub fn value(self, trip: &DerivedTripRecord) -> Option<f64> {
        match self {
            RankField::TripDistanceKm => Some(trip.trip_distance_km),
            RankField::SpeedKmph => Some(trip.speed_kmph),
            RankField::TripDuration => Some(trip.trip_duration as f64),
            RankField::PickupHour => Some(f64::from(trip.pickup_hour)),
            RankField::PassengerCount => trip.passenger_count.map(f64::from),
        }
    }
}

impl fmt::Display for RankField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RankField {
    type Err = SelectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if let Some(field) = Self::ALL.iter().copied().find(|f| f.name() == name) {
            return Ok(field);
        }
        if NON_NUMERIC_FIELDS.contains(&name) {
            return Err(SelectError::NotNumeric(name.to_string()));
        }
        Err(SelectError::UnknownField(name.to_string()))
    }
}

/// Fixed-capacity list of the largest values seen so far, descending.
#[derive(Debug, Clone)]
pub struct BoundedTopK<T> {
    k: usize,
    entries: Vec<(f64, T)>,
}

impl<T> BoundedTopK<T> {
    pub fn new(k: usize) -> Result<Self, SelectError> {
        if k == 0 {
            return Err(SelectError::InvalidK(k));
        }
        Ok(Self {
            k,
            entries: Vec::new(),
        })
    }

    /// Offer one item. Returns whether it is in the list afterwards.
    pub fn offer(&mut self, value: f64, item: T) -> bool {
        let inserted = match self.entries.iter().position(|(current, _)| *current < value) {
            Some(index) => {
                self.entries.insert(index, (value, item));
                true
            }
            None if self.entries.len() < self.k => {
                self.entries.push((value, item));
                true
            }
            None => false,
        };
        if self.entries.len() > self.k {
            self.entries.pop();
        }
        inserted
    }

    pub fn capacity(&self) -> usize {
        self.k
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|(value, _)| *value)
    }

    pub fn into_entries(self) -> Vec<(f64, T)> {
        self.entries
    }
}

/// One row of a ranking result. Borrows the trip it ranks.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RankedEntry<'a> {
    pub rank: usize,
    pub field: RankField,
    pub value: f64,
    pub trip: &'a DerivedTripRecord,
}

/// Rank `records` by the field named `field_name`, keeping at most `k`.
pub fn select_top_k<'a>(
    records: &'a [DerivedTripRecord],
    k: usize,
    field_name: &str,
) -> Result<Vec<RankedEntry<'a>>, SelectError> {
    let field = field_name.parse::<RankField>()?;
    select_top_k_by(records, k, field)
}

/// Rank `records` by `field`. Configuration problems, including a record
/// without a value for `field`, are reported before anything is ranked.
pub fn select_top_k_by<'a>(
    records: &'a [DerivedTripRecord],
    k: usize,
    field: RankField,
) -> Result<Vec<RankedEntry<'a>>, SelectError> {
    let mut top = BoundedTopK::new(k)?;
    let values = records
        .iter()
        .enumerate()
        .map(|(index, trip)| {
            field
                .value(trip)
                .ok_or(SelectError::MissingField { field, index })
        })
        .collect::<Result<Vec<f64>, _>>()?;

    for (value, trip) in values.into_iter().zip(records) {
        top.offer(value, trip);
    }
    debug!(%field, k, considered = records.len(), kept = top.len(), "top-k selected");

    Ok(top
        .into_entries()
        .into_iter()
        .enumerate()
        .map(|(i, (value, trip))| RankedEntry {
            rank: i + 1,
            field,
            value,
            trip,
        })
        .collect())
}

/// Rank using a [`TopKConfig`], honoring its candidate cap.
pub fn rank_trips<'a>(
    records: &'a [DerivedTripRecord],
    cfg: &TopKConfig,
) -> Result<Vec<RankedEntry<'a>>, SelectError> {
    let considered = match cfg.candidate_cap {
        Some(cap) => &records[..cap.min(records.len())],
        None => records,
    };
    select_top_k_by(considered, cfg.k, cfg.field)
}
