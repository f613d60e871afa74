use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tt_core::DerivedTripRecord;
use tt_views::filter::{EVENING_PEAK, MORNING_PEAK};
use tt_views::TripFilter;

use crate::csv_io::read_cleaned;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PeakWindow {
    /// 08:00-10:59
    Morning,
    /// 17:00-19:59
    Evening,
}

/// Trip filters shared by the query tools.
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    #[arg(long)]
    pub vendor_id: Option<String>,
    #[arg(long)]
    pub min_distance: Option<f64>,
    #[arg(long)]
    pub max_distance: Option<f64>,
    #[arg(long)]
    pub max_speed: Option<f64>,
    #[arg(long, value_enum)]
    pub peak: Option<PeakWindow>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> TripFilter {
        TripFilter {
            vendor_id: self.vendor_id.clone(),
            min_distance_km: self.min_distance,
            max_distance_km: self.max_distance,
            max_speed_kmph: self.max_speed,
            pickup_hours: self.peak.map(|peak| match peak {
                PeakWindow::Morning => MORNING_PEAK,
                PeakWindow::Evening => EVENING_PEAK,
            }),
        }
    }
}

pub fn load_cleaned(path: &Path) -> Result<Vec<DerivedTripRecord>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    read_cleaned(BufReader::new(file)).with_context(|| format!("reading {}", path.display()))
}
