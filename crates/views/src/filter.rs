use serde::{Deserialize, Serialize};
use tt_core::{storage::parse_trip_id, DerivedTripRecord, TripId};

/// Pickup-hour windows used by the dashboards, inclusive.
pub const MORNING_PEAK: (u8, u8) = (8, 10);
pub const EVENING_PEAK: (u8, u8) = (17, 19);

/// Conjunctive trip filter. Unset fields match everything; ranges are inclusive.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TripFilter {
    pub vendor_id: Option<String>,
    pub min_distance_km: Option<f64>,
    pub max_distance_km: Option<f64>,
    pub max_speed_kmph: Option<f64>,
    pub pickup_hours: Option<(u8, u8)>,
}

impl TripFilter {
    pub fn matches(&self, trip: &DerivedTripRecord) -> bool {
        if let Some(vendor) = &self.vendor_id {
            if trip.vendor_id.as_deref().map(str::trim) != Some(vendor.trim()) {
                return false;
            }
        }
        if self.min_distance_km.is_some_and(|min| trip.trip_distance_km < min) {
            return false;
        }
        if self.max_distance_km.is_some_and(|max| trip.trip_distance_km > max) {
            return false;
        }
        if self.max_speed_kmph.is_some_and(|max| trip.speed_kmph > max) {
            return false;
        }
        if let Some((from, to)) = self.pickup_hours {
            if trip.pickup_hour < from || trip.pickup_hour > to {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, trips: &'a [DerivedTripRecord]) -> Vec<&'a DerivedTripRecord> {
        trips.iter().filter(|trip| self.matches(trip)).collect()
    }
}

/// Look a trip up by its numeric id (`id` prefix ignored on stored ids).
pub fn find_trip(trips: &[DerivedTripRecord], trip_id: TripId) -> Option<&DerivedTripRecord> {
    trips.iter().find(|trip| {
        trip.id
            .as_deref()
            .and_then(|id| parse_trip_id(id).ok())
            .is_some_and(|id| id == trip_id)
    })
}
