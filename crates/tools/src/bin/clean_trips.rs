use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tt_features::{FeatureEngine, TripCleaner};
use tt_runtime::{init_tracing, MetricsRegistry, RunTimer};
use tt_tools::csv_io::{
    read_raw_trips, storage_rows, write_cleaned, write_exclusions, write_rows, write_vendors,
};
use tt_tools::PipelineConfig;

/// Clean a raw trip CSV: derive features, drop implausible trips and write
/// the cleaned file plus an exclusion log.
#[derive(Debug, Parser)]
#[command(name = "clean_trips")]
struct Cli {
    /// JSON pipeline config; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long)]
    exclusions: Option<PathBuf>,
    /// Also write trips/locations/vendors table rows into this directory.
    #[arg(long)]
    storage_dir: Option<PathBuf>,
    #[arg(long)]
    max_speed: Option<f64>,
    /// Print a JSON metrics line when done.
    #[arg(long)]
    metrics: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut cfg = PipelineConfig::load_or_default(cli.config.as_deref())?;
    if let Some(input) = cli.input {
        cfg.input = input;
    }
    if let Some(output) = cli.output {
        cfg.cleaned_output = output;
    }
    if let Some(exclusions) = cli.exclusions {
        cfg.exclusion_log = exclusions;
    }
    if cli.storage_dir.is_some() {
        cfg.storage_dir = cli.storage_dir;
    }
    if let Some(max_speed) = cli.max_speed {
        cfg.validity.max_speed_kmph = max_speed;
    }

    let timer = RunTimer::start();
    let metrics = MetricsRegistry::default();
    let engine = FeatureEngine::new(cfg.validity.clone())?;
    let cleaner = TripCleaner::new(engine, metrics.clone());

    info!(input = %cfg.input.display(), "loading dataset");
    let file = File::open(&cfg.input)
        .with_context(|| format!("opening input {}", cfg.input.display()))?;
    let batch = read_raw_trips(BufReader::new(file))
        .with_context(|| format!("reading input {}", cfg.input.display()))?;
    if batch.unreadable_rows > 0 {
        warn!(rows = batch.unreadable_rows, "rows skipped by the CSV reader");
    }
    info!(rows = batch.records.len(), "initial rows");

    let outcome = cleaner.clean(batch.records);

    write_cleaned(create(&cfg.cleaned_output)?, &outcome.admitted)?;
    write_exclusions(create(&cfg.exclusion_log)?, &outcome.exclusions)?;
    info!(
        "Excluded {} invalid records logged in {}",
        outcome.exclusions.len(),
        cfg.exclusion_log.display()
    );
    info!(
        rows = outcome.admitted.len(),
        "Clean dataset saved to {}",
        cfg.cleaned_output.display()
    );

    if let Some(dir) = &cfg.storage_dir {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        let rows = storage_rows(&outcome.admitted, cfg.weekday_encoding);
        write_rows(create(&dir.join("trips.csv"))?, &rows.trips)?;
        write_rows(create(&dir.join("locations.csv"))?, &rows.locations)?;
        write_vendors(create(&dir.join("vendors.csv"))?, &rows.vendors)?;
        info!(
            trips = rows.trips.len(),
            vendors = rows.vendors.len(),
            skipped = rows.skipped,
            "storage rows written to {}",
            dir.display()
        );
    }

    if cli.metrics {
        println!("{}", metrics.snapshot().to_json_line("clean_trips", Some(timer.elapsed())));
    }
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    Ok(BufWriter::new(file))
}
