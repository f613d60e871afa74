//! Admission rules applied after the derived features are computed.

use tt_core::ExclusionReason;

/// The numeric features the admission rules look at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TripFeatures {
    pub trip_duration: i64,
    pub trip_distance_km: f64,
    pub speed_kmph: f64,
}

/// A single plausibility check. Returns the exclusion reason when the trip fails.
pub trait AdmissionRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn check(&self, features: &TripFeatures) -> Option<ExclusionReason>;
}

pub struct PositiveDuration;

impl AdmissionRule for PositiveDuration {
    fn name(&self) -> &'static str {
        "positive_duration"
    }

    fn check(&self, features: &TripFeatures) -> Option<ExclusionReason> {
        (features.trip_duration <= 0).then_some(ExclusionReason::NonPositiveDuration {
            duration_s: features.trip_duration,
        })
    }
}

pub struct PositiveDistance;

impl AdmissionRule for PositiveDistance {
    fn name(&self) -> &'static str {
        "positive_distance"
    }

    fn check(&self, features: &TripFeatures) -> Option<ExclusionReason> {
        // NaN never compares `> 0`, so it is rejected here as well.
        (!(features.trip_distance_km > 0.0)).then_some(ExclusionReason::NonPositiveDistance {
            distance_km: features.trip_distance_km,
        })
    }
}

pub struct SpeedLimit {
    pub max_kmph: f64,
}

impl AdmissionRule for SpeedLimit {
    fn name(&self) -> &'static str {
        "speed_limit"
    }

    fn check(&self, features: &TripFeatures) -> Option<ExclusionReason> {
        (!(features.speed_kmph <= self.max_kmph)).then_some(ExclusionReason::ImplausibleSpeed {
            speed_kmph: features.speed_kmph,
            limit_kmph: self.max_kmph,
        })
    }
}

/// Ordered set of rules; the first failing rule decides the exclusion reason.
pub struct AdmissionPolicy {
    rules: Vec<Box<dyn AdmissionRule>>,
}

impl AdmissionPolicy {
    pub fn new(rules: Vec<Box<dyn AdmissionRule>>) -> Self {
        Self { rules }
    }

    /// Duration, then distance, then speed.
    pub fn standard(max_speed_kmph: f64) -> Self {
        Self::new(vec![
            Box::new(PositiveDuration),
            Box::new(PositiveDistance),
            Box::new(SpeedLimit {
                max_kmph: max_speed_kmph,
            }),
        ])
    }

    pub fn evaluate(&self, features: &TripFeatures) -> Result<(), ExclusionReason> {
        match self.rules.iter().find_map(|rule| rule.check(features)) {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }
}
