use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info};
use tt_core::{DerivedTripRecord, ExclusionLog, RawTripRecord};
use tt_runtime::MetricsRegistry;

use crate::engine::{FeatureEngine, Verdict};

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct CleaningStats {
    pub raw: usize,
    pub duplicates: usize,
    pub admitted: usize,
    pub excluded: usize,
}

#[derive(Debug, Clone, Default)]
pub struct CleaningOutcome {
    pub admitted: Vec<DerivedTripRecord>,
    pub exclusions: ExclusionLog,
    pub stats: CleaningStats,
}

/// Runs a batch of raw records through deduplication and the feature engine.
pub struct TripCleaner {
    engine: FeatureEngine,
    metrics: MetricsRegistry,
}

impl TripCleaner {
    pub fn new(engine: FeatureEngine, metrics: MetricsRegistry) -> Self {
        Self { engine, metrics }
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Clean one batch. Identical raw records after the first are dropped
    /// without being logged; every other record is either admitted or appended
    /// to the exclusion log, in input order.
    pub fn clean<I>(&self, records: I) -> CleaningOutcome
    where
        I: IntoIterator<Item = RawTripRecord>,
    {
        let mut outcome = CleaningOutcome::default();
        let mut seen: HashSet<RawTripRecord> = HashSet::new();

        for raw in records {
            outcome.stats.raw += 1;
            if seen.contains(&raw) {
                outcome.stats.duplicates += 1;
                continue;
            }

            match self.engine.derive_and_validate(&raw) {
                Verdict::Admitted(trip) => outcome.admitted.push(trip),
                Verdict::Excluded(excluded) => {
                    debug!(id = ?excluded.raw.id, reason = %excluded.reason, "record excluded");
                    self.metrics.inc_excluded(excluded.reason.class(), 1);
                    outcome.exclusions.push(excluded);
                }
            }
            seen.insert(raw);
        }

        outcome.stats.admitted = outcome.admitted.len();
        outcome.stats.excluded = outcome.exclusions.len();

        self.metrics.inc_raw_records(outcome.stats.raw as u64);
        self.metrics.inc_duplicates_dropped(outcome.stats.duplicates as u64);
        self.metrics.inc_admitted(outcome.stats.admitted as u64);

        info!(
            raw = outcome.stats.raw,
            duplicates = outcome.stats.duplicates,
            admitted = outcome.stats.admitted,
            excluded = outcome.stats.excluded,
            "batch cleaned"
        );
        outcome
    }
}
