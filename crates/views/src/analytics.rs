use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tt_core::DerivedTripRecord;

/// Bin edges of the distance histogram, in km. Bin `i` covers
/// `[EDGES[i], EDGES[i + 1])`; trips at or beyond the last edge are counted
/// as overflow.
pub const DISTANCE_BIN_EDGES: [f64; 7] = [0.0, 1.0, 2.0, 5.0, 10.0, 20.0, 50.0];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TripSummary {
    pub total_trips: usize,
    pub avg_distance_km: Option<f64>,
    pub avg_speed_kmph: Option<f64>,
    pub avg_duration_s: Option<f64>,
    pub most_common_passenger_count: Option<u32>,
}

pub fn summarize<'a, I>(trips: I) -> TripSummary
where
    I: IntoIterator<Item = &'a DerivedTripRecord>,
{
    let mut total = 0usize;
    let mut distance = 0.0;
    let mut speed = 0.0;
    let mut duration = 0.0;
    let mut passengers: BTreeMap<u32, usize> = BTreeMap::new();

    for trip in trips {
        total += 1;
        distance += trip.trip_distance_km;
        speed += trip.speed_kmph;
        duration += trip.trip_duration as f64;
        if let Some(count) = trip.passenger_count {
            *passengers.entry(count).or_default() += 1;
        }
    }

    let mean = |sum: f64| (total > 0).then(|| sum / total as f64);
    // Ties go to the smallest passenger count.
    let most_common_passenger_count = passengers
        .iter()
        .fold(None, |best: Option<(u32, usize)>, (&count, &n)| match best {
            Some((_, best_n)) if best_n >= n => best,
            _ => Some((count, n)),
        })
        .map(|(count, _)| count);

    TripSummary {
        total_trips: total,
        avg_distance_km: mean(distance),
        avg_speed_kmph: mean(speed),
        avg_duration_s: mean(duration),
        most_common_passenger_count,
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DistanceBin {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DistanceHistogram {
    pub bins: Vec<DistanceBin>,
    pub overflow: usize,
}

pub fn distance_histogram<'a, I>(trips: I) -> DistanceHistogram
where
    I: IntoIterator<Item = &'a DerivedTripRecord>,
{
    let mut bins: Vec<DistanceBin> = DISTANCE_BIN_EDGES
        .windows(2)
        .map(|edge| DistanceBin {
            label: format!("{}-{}", edge[0], edge[1]),
            count: 0,
        })
        .collect();
    let mut overflow = 0;

    for trip in trips {
        let d = trip.trip_distance_km;
        match DISTANCE_BIN_EDGES
            .windows(2)
            .position(|edge| d >= edge[0] && d < edge[1])
        {
            Some(i) => bins[i].count += 1,
            None if d >= DISTANCE_BIN_EDGES[DISTANCE_BIN_EDGES.len() - 1] => overflow += 1,
            None => {}
        }
    }

    DistanceHistogram { bins, overflow }
}

pub fn vendor_counts<'a, I>(trips: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a DerivedTripRecord>,
{
    let mut counts = BTreeMap::new();
    for trip in trips {
        let vendor = trip.vendor_id.clone().unwrap_or_else(|| "unknown".to_string());
        *counts.entry(vendor).or_default() += 1;
    }
    counts
}

pub fn trips_per_day<'a, I>(trips: I) -> BTreeMap<NaiveDate, usize>
where
    I: IntoIterator<Item = &'a DerivedTripRecord>,
{
    let mut counts = BTreeMap::new();
    for trip in trips {
        *counts.entry(trip.pickup_datetime.date()).or_default() += 1;
    }
    counts
}

/// Mean trip duration in seconds for each pickup hour 0..24; `None` for
/// hours with no trips.
pub fn avg_duration_per_hour<'a, I>(trips: I) -> [Option<f64>; 24]
where
    I: IntoIterator<Item = &'a DerivedTripRecord>,
{
    let mut sums = [0.0f64; 24];
    let mut counts = [0usize; 24];
    for trip in trips {
        let hour = usize::from(trip.pickup_hour).min(23);
        sums[hour] += trip.trip_duration as f64;
        counts[hour] += 1;
    }
    let mut out = [None; 24];
    for hour in 0..24 {
        if counts[hour] > 0 {
            out[hour] = Some(sums[hour] / counts[hour] as f64);
        }
    }
    out
}
