//! Feature derivation and admission checks for raw trip records.

use serde::{Deserialize, Serialize};

pub mod admission;
pub mod engine;
pub mod geo;
pub mod pipeline;
pub mod timestamp;

pub use admission::{AdmissionPolicy, AdmissionRule, TripFeatures};
pub use engine::{FeatureEngine, Verdict};
pub use geo::{haversine_km, EARTH_RADIUS_KM};
pub use pipeline::{CleaningOutcome, CleaningStats, TripCleaner};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("max_speed_kmph must be positive and finite, got {0}")]
    InvalidSpeedLimit(f64),
    #[error("earth_radius_km must be positive and finite, got {0}")]
    InvalidEarthRadius(f64),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValidityConfig {
    /// Average speeds above this are treated as implausible.
    pub max_speed_kmph: f64,
    pub earth_radius_km: f64,
}

impl Default for ValidityConfig {
    fn default() -> Self {
        Self {
            max_speed_kmph: 120.0,
            earth_radius_km: EARTH_RADIUS_KM,
        }
    }
}

impl ValidityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_speed_kmph.is_finite() && self.max_speed_kmph > 0.0) {
            return Err(ConfigError::InvalidSpeedLimit(self.max_speed_kmph));
        }
        if !(self.earth_radius_km.is_finite() && self.earth_radius_km > 0.0) {
            return Err(ConfigError::InvalidEarthRadius(self.earth_radius_km));
        }
        Ok(())
    }
}
