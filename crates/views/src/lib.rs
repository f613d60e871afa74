//! Views over cleaned trips: bounded top-K ranking, filters and summaries.

use serde::{Deserialize, Serialize};

pub mod analytics;
pub mod filter;
pub mod topk;

pub use analytics::{summarize, TripSummary};
pub use filter::TripFilter;
pub use topk::{rank_trips, select_top_k, BoundedTopK, RankField, RankedEntry, SelectError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TopKConfig {
    pub k: usize,
    pub field: RankField,
    /// Only this many leading records are offered to the selector.
    pub candidate_cap: Option<usize>,
}

impl Default for TopKConfig {
    fn default() -> Self {
        Self {
            k: 10,
            field: RankField::TripDistanceKm,
            candidate_cap: Some(1000),
        }
    }
}
