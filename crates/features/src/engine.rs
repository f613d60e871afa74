use chrono::{Datelike, NaiveDateTime, Timelike};
use tt_core::{
    DayOfWeek, DerivedTripRecord, ExcludedRecord, ExclusionReason, GeoPoint, PartialFeatures,
    RawTripRecord,
};

use crate::admission::{AdmissionPolicy, TripFeatures};
use crate::geo::haversine_km;
use crate::timestamp::parse_timestamp;
use crate::{ConfigError, ValidityConfig};

/// Outcome of deriving and validating one raw record.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Admitted(DerivedTripRecord),
    Excluded(ExcludedRecord),
}

impl Verdict {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Verdict::Admitted(_))
    }
}

/// Input fields after presence and numeric checks, before timestamps are read.
struct CheckedInput<'a> {
    pickup_datetime: &'a str,
    dropoff_datetime: &'a str,
    pickup: GeoPoint,
    dropoff: GeoPoint,
    trip_duration: i64,
    passenger_count: Option<u32>,
}

pub struct FeatureEngine {
    cfg: ValidityConfig,
    policy: AdmissionPolicy,
}

impl FeatureEngine {
    pub fn new(cfg: ValidityConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let policy = AdmissionPolicy::standard(cfg.max_speed_kmph);
        Ok(Self { cfg, policy })
    }

    pub fn with_policy(cfg: ValidityConfig, policy: AdmissionPolicy) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self { cfg, policy })
    }

    pub fn config(&self) -> &ValidityConfig {
        &self.cfg
    }

    /// Derive distance, speed, pickup hour and weekday, then apply the admission
    /// policy. Never fails: bad input becomes an exclusion.
    pub fn derive_and_validate(&self, raw: &RawTripRecord) -> Verdict {
        let exclude = |features: PartialFeatures, reason: ExclusionReason| {
            Verdict::Excluded(ExcludedRecord {
                raw: raw.clone(),
                features,
                reason,
            })
        };

        let input = match check_input(raw) {
            Ok(input) => input,
            Err(reason) => return exclude(PartialFeatures::default(), reason),
        };

        let pickup_datetime = match read_timestamp("pickup_datetime", input.pickup_datetime) {
            Ok(ts) => ts,
            Err(reason) => return exclude(PartialFeatures::default(), reason),
        };
        let dropoff_datetime = match read_timestamp("dropoff_datetime", input.dropoff_datetime) {
            Ok(ts) => ts,
            Err(reason) => return exclude(PartialFeatures::default(), reason),
        };

        let trip_distance_km = haversine_km(&input.pickup, &input.dropoff, self.cfg.earth_radius_km);
        let speed_kmph = average_speed_kmph(trip_distance_km, input.trip_duration);
        let pickup_hour = pickup_datetime.hour() as u8;
        let pickup_dayofweek = DayOfWeek::from(pickup_datetime.weekday());

        let features = TripFeatures {
            trip_duration: input.trip_duration,
            trip_distance_km,
            speed_kmph,
        };
        if let Err(reason) = self.policy.evaluate(&features) {
            let partial = PartialFeatures {
                trip_distance_km: Some(trip_distance_km),
                speed_kmph: Some(speed_kmph),
                pickup_hour: Some(pickup_hour),
                pickup_dayofweek: Some(pickup_dayofweek),
            };
            return exclude(partial, reason);
        }

        Verdict::Admitted(DerivedTripRecord {
            id: raw.id.clone(),
            vendor_id: raw.vendor_id.clone(),
            pickup_datetime,
            dropoff_datetime,
            passenger_count: input.passenger_count,
            pickup: input.pickup,
            dropoff: input.dropoff,
            store_and_fwd_flag: raw.store_and_fwd_flag.clone(),
            trip_duration: input.trip_duration,
            trip_distance_km,
            speed_kmph,
            pickup_hour,
            pickup_dayofweek,
        })
    }
}

/// Distance over duration in km/h. A zero duration yields +inf; a negative
/// one yields the (negative) quotient as computed.
pub fn average_speed_kmph(distance_km: f64, duration_s: i64) -> f64 {
    if duration_s == 0 {
        return f64::INFINITY;
    }
    distance_km / (duration_s as f64 / 3600.0)
}

fn check_input(raw: &RawTripRecord) -> Result<CheckedInput<'_>, ExclusionReason> {
    let pickup_datetime = required("pickup_datetime", &raw.pickup_datetime)?;
    let dropoff_datetime = required("dropoff_datetime", &raw.dropoff_datetime)?;
    let pickup_longitude = required("pickup_longitude", &raw.pickup_longitude)?;
    let pickup_latitude = required("pickup_latitude", &raw.pickup_latitude)?;
    let dropoff_longitude = required("dropoff_longitude", &raw.dropoff_longitude)?;
    let dropoff_latitude = required("dropoff_latitude", &raw.dropoff_latitude)?;
    let trip_duration = required("trip_duration", &raw.trip_duration)?;

    let pickup = GeoPoint::new(
        coordinate("pickup_latitude", pickup_latitude)?,
        coordinate("pickup_longitude", pickup_longitude)?,
    );
    let dropoff = GeoPoint::new(
        coordinate("dropoff_latitude", dropoff_latitude)?,
        coordinate("dropoff_longitude", dropoff_longitude)?,
    );
    let trip_duration = whole_number("trip_duration", trip_duration)?;

    let passenger_count = match present(&raw.passenger_count) {
        Some(value) => Some(
            whole_number("passenger_count", value)
                .ok()
                .and_then(|count| u32::try_from(count).ok())
                .ok_or_else(|| invalid("passenger_count", value))?,
        ),
        None => None,
    };

    Ok(CheckedInput {
        pickup_datetime,
        dropoff_datetime,
        pickup,
        dropoff,
        trip_duration,
        passenger_count,
    })
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn required<'a>(field: &str, value: &'a Option<String>) -> Result<&'a str, ExclusionReason> {
    present(value).ok_or_else(|| ExclusionReason::MissingInput {
        field: field.to_string(),
    })
}

fn invalid(field: &str, value: &str) -> ExclusionReason {
    ExclusionReason::InvalidInput {
        field: field.to_string(),
        value: value.to_string(),
    }
}

fn coordinate(field: &str, value: &str) -> Result<f64, ExclusionReason> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(field, value))
}

/// Integer field; accepts integral floats like `455.0` or `1.0`.
fn whole_number(field: &str, value: &str) -> Result<i64, ExclusionReason> {
    if let Ok(n) = value.parse::<i64>() {
        return Ok(n);
    }
    match value.parse::<f64>() {
        Ok(n) if n.is_finite() && n.fract() == 0.0 => Ok(n as i64),
        _ => Err(invalid(field, value)),
    }
}

fn read_timestamp(field: &str, value: &str) -> Result<NaiveDateTime, ExclusionReason> {
    parse_timestamp(value).ok_or_else(|| ExclusionReason::InvalidTimestamp {
        field: field.to_string(),
        value: value.to_string(),
    })
}
