//! Builds a [`TrafficEngine`] from files named on the command line.

use std::path::{Path, PathBuf};
use std::time::Instant;

use bike_map_cli_utils::{IndicatifProgress, MultiProgress};
use bike_map_source::progress::ProgressCallback;
use bike_map_source::{SourceSchema, find_schema, load_stations, load_trips, parse_schema_toml};
use bike_map_traffic::{TrafficEngine, TripIndexBuilder};
use bike_map_traffic_models::{AggregationStrategy, TrafficConfig};
use clap::Args;

/// Flags shared by every command that loads data.
#[derive(Debug, Clone, Args)]
pub struct LoadArgs {
    /// Trip export (CSV with a header row)
    #[arg(long)]
    pub trips: PathBuf,
    /// Station list (JSON or CSV, as the schema declares)
    #[arg(long)]
    pub stations: PathBuf,
    /// Embedded schema id (see `bike_map schemas`)
    #[arg(long, default_value = "bluebikes")]
    pub schema: String,
    /// Schema TOML file, used instead of an embedded schema
    #[arg(long)]
    pub schema_file: Option<PathBuf>,
    /// Engine config TOML (`half_width_minutes`, `strategy`)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Minutes on each side of the selected minute (overrides config)
    #[arg(long)]
    pub half_width: Option<u16>,
    /// Aggregation strategy: scan or prefix (overrides config)
    #[arg(long, value_parser = parse_strategy)]
    pub strategy: Option<AggregationStrategy>,
}

fn parse_strategy(s: &str) -> Result<AggregationStrategy, String> {
    s.parse()
        .map_err(|_| format!("unknown strategy '{s}' (expected scan or prefix)"))
}

/// Picks the schema file if one was given, otherwise the embedded schema.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if no embedded
/// schema has the requested id.
pub fn resolve_schema(args: &LoadArgs) -> Result<SourceSchema, Box<dyn std::error::Error>> {
    let schema = match &args.schema_file {
        Some(path) => parse_schema_toml(&std::fs::read_to_string(path)?)?,
        None => find_schema(&args.schema)?,
    };
    log::debug!("Using schema {} ({})", schema.id, schema.name);
    Ok(schema)
}

/// Reads the config file (if any) and applies command line overrides.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or is not valid TOML.
pub fn resolve_config(args: &LoadArgs) -> Result<TrafficConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => TrafficConfig::default(),
    };

    if let Some(half_width) = args.half_width {
        config.half_width_minutes = half_width;
    }
    if let Some(strategy) = args.strategy {
        config.strategy = strategy;
    }

    Ok(config)
}

fn read_config(path: &Path) -> Result<TrafficConfig, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    let config = toml::from_str(&text)?;
    log::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Loads stations and trips, bulk-ingests the trips, and builds the engine.
///
/// # Errors
///
/// Returns an error if any input cannot be read or the configuration is
/// invalid. Unusable trip rows and unparseable timestamps are skipped, not
/// errors.
pub fn load_engine(
    args: &LoadArgs,
    multi: &MultiProgress,
) -> Result<TrafficEngine, Box<dyn std::error::Error>> {
    let schema = resolve_schema(args)?;
    let config = resolve_config(args)?;

    let start = Instant::now();
    let stations = load_stations(&args.stations, &schema.stations)?;

    let progress = IndicatifProgress::bytes_bar(multi, "Reading trips");
    let batch = load_trips(&args.trips, &schema.trips, &progress)?;
    progress.finish_and_clear();

    let mut builder = TripIndexBuilder::new();
    builder.ingest_all(batch.trips);
    let report = builder.report();
    let index = builder.build();

    log::info!(
        "Loaded {} stations and {} trips in {:.1}s ({} rows unusable, {} bad timestamps)",
        stations.len(),
        report.ingested,
        start.elapsed().as_secs_f64(),
        batch.skipped,
        report.skipped
    );

    Ok(TrafficEngine::new(index, stations, config)?)
}
