use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tt_core::ExclusionClass;

#[derive(Clone, Default)]
pub struct MetricsRegistry {
    inner: Arc<MetricsInner>,
}

#[derive(Default)]
struct MetricsInner {
    raw_records: AtomicU64,
    duplicates_dropped: AtomicU64,
    admitted: AtomicU64,
    excluded_input: AtomicU64,
    excluded_timestamp: AtomicU64,
    excluded_implausible: AtomicU64,
    ranked_queries: AtomicU64,
}

impl MetricsRegistry {
    pub fn inc_raw_records(&self, delta: u64) {
        self.inner.raw_records.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_duplicates_dropped(&self, delta: u64) {
        self.inner.duplicates_dropped.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_admitted(&self, delta: u64) {
        self.inner.admitted.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_excluded(&self, class: ExclusionClass, delta: u64) {
        let counter = match class {
            ExclusionClass::Input => &self.inner.excluded_input,
            ExclusionClass::Timestamp => &self.inner.excluded_timestamp,
            ExclusionClass::Implausible => &self.inner.excluded_implausible,
        };
        counter.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_ranked_queries(&self, delta: u64) {
        self.inner.ranked_queries.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            raw_records: self.inner.raw_records.load(Ordering::Relaxed),
            duplicates_dropped: self.inner.duplicates_dropped.load(Ordering::Relaxed),
            admitted: self.inner.admitted.load(Ordering::Relaxed),
            excluded_input: self.inner.excluded_input.load(Ordering::Relaxed),
            excluded_timestamp: self.inner.excluded_timestamp.load(Ordering::Relaxed),
            excluded_implausible: self.inner.excluded_implausible.load(Ordering::Relaxed),
            ranked_queries: self.inner.ranked_queries.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub raw_records: u64,
    pub duplicates_dropped: u64,
    pub admitted: u64,
    pub excluded_input: u64,
    pub excluded_timestamp: u64,
    pub excluded_implausible: u64,
    pub ranked_queries: u64,
}

impl MetricsSnapshot {
    pub fn excluded_total(&self) -> u64 {
        self.excluded_input + self.excluded_timestamp + self.excluded_implausible
    }

    pub fn to_json_line(&self, label: &str, elapsed: Option<Duration>) -> String {
        #[derive(Serialize)]
        struct Snapshot<'a> {
            label: &'a str,
            #[serde(flatten)]
            counters: &'a MetricsSnapshot,
            excluded_total: u64,
            elapsed_ms: Option<u128>,
        }

        let payload = Snapshot {
            label,
            counters: self,
            excluded_total: self.excluded_total(),
            elapsed_ms: elapsed.map(|d| d.as_millis()),
        };
        serde_json::to_string(&payload).unwrap_or_else(|_| String::from("{}"))
    }
}

pub struct RunTimer {
    start: Instant,
}

impl RunTimer {
    pub fn start() -> Self {
        Self { start: Instant::now() }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
