use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tt_runtime::{init_tracing, MetricsRegistry, RunTimer};
use tt_tools::cli::{load_cleaned, FilterArgs};
use tt_tools::PipelineConfig;
use tt_views::{rank_trips, RankField};

/// Rank cleaned trips by a numeric field and print the top K as JSON.
#[derive(Debug, Parser)]
#[command(name = "top_trips")]
struct Cli {
    #[arg(long)]
    config: Option<PathBuf>,
    /// Cleaned trips CSV; defaults to the config's cleaned output.
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long)]
    k: Option<usize>,
    /// trip_distance_km, speed_kmph, trip_duration, pickup_hour or passenger_count.
    #[arg(long)]
    field: Option<String>,
    /// Only the first N filtered trips are considered.
    #[arg(long, conflicts_with = "no_cap")]
    cap: Option<usize>,
    #[arg(long)]
    no_cap: bool,
    /// Print a JSON metrics line to stderr when done.
    #[arg(long)]
    metrics: bool,
    #[command(flatten)]
    filter: FilterArgs,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let timer = RunTimer::start();
    let metrics = MetricsRegistry::default();
    let cfg = PipelineConfig::load_or_default(cli.config.as_deref())?;
    let mut top_k = cfg.top_k.clone();
    if let Some(k) = cli.k {
        top_k.k = k;
    }
    if let Some(field) = &cli.field {
        top_k.field = field.parse::<RankField>()?;
    }
    if let Some(cap) = cli.cap {
        top_k.candidate_cap = Some(cap);
    }
    if cli.no_cap {
        top_k.candidate_cap = None;
    }

    let input = cli.input.unwrap_or(cfg.cleaned_output);
    let trips = load_cleaned(&input)?;
    let filter = cli.filter.to_filter();
    let candidates: Vec<_> = filter.apply(&trips).into_iter().cloned().collect();

    let ranked = rank_trips(&candidates, &top_k)?;
    metrics.inc_ranked_queries(1);
    info!(
        field = %top_k.field,
        k = top_k.k,
        candidates = candidates.len(),
        returned = ranked.len(),
        "ranking complete"
    );
    println!("{}", serde_json::to_string_pretty(&ranked)?);
    if cli.metrics {
        eprintln!("{}", metrics.snapshot().to_json_line("top_trips", Some(timer.elapsed())));
    }
    Ok(())
}
