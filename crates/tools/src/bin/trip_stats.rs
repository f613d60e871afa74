use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;
use serde::Serialize;
use tt_core::TripId;
use tt_runtime::init_tracing;
use tt_tools::cli::{load_cleaned, FilterArgs};
use tt_tools::PipelineConfig;
use tt_views::analytics::{
    avg_duration_per_hour, distance_histogram, trips_per_day, vendor_counts, DistanceHistogram,
};
use tt_views::filter::find_trip;
use tt_views::{summarize, TripSummary};

/// Summary statistics over cleaned trips, or a single trip by id.
#[derive(Debug, Parser)]
#[command(name = "trip_stats")]
struct Cli {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    input: Option<PathBuf>,
    /// Print only the trip with this numeric id.
    #[arg(long)]
    trip_id: Option<TripId>,
    #[command(flatten)]
    filter: FilterArgs,
}

#[derive(Serialize)]
struct Report {
    summary: TripSummary,
    distance_histogram: DistanceHistogram,
    vendors: std::collections::BTreeMap<String, usize>,
    trips_per_day: std::collections::BTreeMap<chrono::NaiveDate, usize>,
    avg_duration_per_hour: Vec<Option<f64>>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let cfg = PipelineConfig::load_or_default(cli.config.as_deref())?;
    let input = cli.input.unwrap_or(cfg.cleaned_output);
    let trips = load_cleaned(&input)?;

    if let Some(trip_id) = cli.trip_id {
        let trip = find_trip(&trips, trip_id).ok_or_else(|| anyhow!("trip {trip_id} not found"))?;
        println!("{}", serde_json::to_string_pretty(trip)?);
        return Ok(());
    }

    let selected = cli.filter.to_filter().apply(&trips);
    let report = Report {
        summary: summarize(selected.iter().copied()),
        distance_histogram: distance_histogram(selected.iter().copied()),
        vendors: vendor_counts(selected.iter().copied()),
        trips_per_day: trips_per_day(selected.iter().copied()),
        avg_duration_per_hour: avg_duration_per_hour(selected.iter().copied()).to_vec(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
