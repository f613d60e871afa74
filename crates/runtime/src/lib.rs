//! Runtime bootstrap: tracing setup and pipeline metrics.

use tracing::Level;

pub mod metrics;

pub use metrics::{MetricsRegistry, MetricsSnapshot, RunTimer};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_max_level(Level::INFO)
        .try_init();
}
