use serde::{Deserialize, Serialize};

use crate::trip::RawTripRecord;
use crate::weekday::DayOfWeek;

/// Why a record was rejected by the validity checks.
#[derive(thiserror::Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExclusionReason {
    #[error("missing/invalid input: {field} is missing")]
    MissingInput { field: String },
    #[error("missing/invalid input: {field} = '{value}'")]
    InvalidInput { field: String, value: String },
    #[error("invalid timestamp: {field} = '{value}'")]
    InvalidTimestamp { field: String, value: String },
    #[error("trip duration {duration_s}s is not positive")]
    NonPositiveDuration { duration_s: i64 },
    #[error("trip distance {distance_km} km is not positive")]
    NonPositiveDistance { distance_km: f64 },
    #[error("average speed {speed_kmph:.2} km/h exceeds {limit_kmph} km/h")]
    ImplausibleSpeed { speed_kmph: f64, limit_kmph: f64 },
}

/// Coarse grouping of exclusion reasons for run statistics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionClass {
    Input,
    Timestamp,
    Implausible,
}

impl ExclusionReason {
    pub fn class(&self) -> ExclusionClass {
        match self {
            ExclusionReason::MissingInput { .. } | ExclusionReason::InvalidInput { .. } => {
                ExclusionClass::Input
            }
            ExclusionReason::InvalidTimestamp { .. } => ExclusionClass::Timestamp,
            ExclusionReason::NonPositiveDuration { .. }
            | ExclusionReason::NonPositiveDistance { .. }
            | ExclusionReason::ImplausibleSpeed { .. } => ExclusionClass::Implausible,
        }
    }
}

/// Derived fields computed before a record was rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PartialFeatures {
    pub trip_distance_km: Option<f64>,
    pub speed_kmph: Option<f64>,
    pub pickup_hour: Option<u8>,
    pub pickup_dayofweek: Option<DayOfWeek>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExcludedRecord {
    pub raw: RawTripRecord,
    pub features: PartialFeatures,
    pub reason: ExclusionReason,
}

/// Append-only audit log of rejected records. Entries are never modified
/// once pushed.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ExclusionLog {
    entries: Vec<ExcludedRecord>,
}

impl ExclusionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ExcludedRecord) {
        self.entries.push(record);
    }

    pub fn entries(&self) -> &[ExcludedRecord] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExcludedRecord> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count_class(&self, class: ExclusionClass) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.reason.class() == class)
            .count()
    }

    pub fn into_entries(self) -> Vec<ExcludedRecord> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a ExclusionLog {
    type Item = &'a ExcludedRecord;
    type IntoIter = std::slice::Iter<'a, ExcludedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn excluded(reason: ExclusionReason) -> ExcludedRecord {
        ExcludedRecord {
            raw: RawTripRecord::default(),
            features: PartialFeatures::default(),
            reason,
        }
    }

    #[test]
    fn log_keeps_insertion_order_and_counts_classes() {
        let mut log = ExclusionLog::new();
        log.push(excluded(ExclusionReason::MissingInput {
            field: "pickup_latitude".into(),
        }));
        log.push(excluded(ExclusionReason::NonPositiveDuration { duration_s: 0 }));
        log.push(excluded(ExclusionReason::ImplausibleSpeed {
            speed_kmph: 300.0,
            limit_kmph: 120.0,
        }));

        assert_eq!(log.len(), 3);
        assert_eq!(log.count_class(ExclusionClass::Input), 1);
        assert_eq!(log.count_class(ExclusionClass::Implausible), 2);
        assert_eq!(log.count_class(ExclusionClass::Timestamp), 0);
        assert!(matches!(
            log.entries()[1].reason,
            ExclusionReason::NonPositiveDuration { duration_s: 0 }
        ));
    }

    #[test]
    fn reasons_render_readable_messages() {
        let reason = ExclusionReason::InvalidTimestamp {
            field: "pickup_datetime".into(),
            value: "yesterday".into(),
        };
        assert_eq!(
            reason.to_string(),
            "invalid timestamp: pickup_datetime = 'yesterday'"
        );
    }
}
