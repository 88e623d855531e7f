#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command line front end for station traffic queries.
//!
//! Loads a station list and a trip export through a source schema, builds
//! the minute-of-day index once, and answers time-of-day traffic queries
//! against it.
//!
//! Uses `indicatif-log-bridge` (via [`bike_map_cli_utils::init_logger`]) so
//! log lines and progress bars never fight for the terminal.

mod load;
mod report;

use std::time::Instant;

use bike_map_cli_utils::IndicatifProgress;
use bike_map_trip_models::{MinuteOfDay, TimeFilter};
use clap::{Parser, Subcommand};

use crate::load::{LoadArgs, load_engine};

#[derive(Parser)]
#[command(
    name = "bike_map",
    about = "Bike share station traffic by time of day"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the embedded source schemas
    Schemas,
    /// Count departures and arrivals per station around one minute of day
    Query {
        #[command(flatten)]
        load: LoadArgs,
        /// Minute of day to center on (0-1439), or -1 for the whole day
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        minute: i32,
        /// Number of stations to print
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Print the full snapshot as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print selected departures and arrivals at the top of every hour
    Profile {
        #[command(flatten)]
        load: LoadArgs,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = bike_map_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Schemas => {
            println!("{:<20} NAME", "ID");
            println!("{}", "-".repeat(60));
            for schema in bike_map_source::all_schemas() {
                println!("{:<20} {}", schema.id, schema.name);
                if let Some(description) = &schema.description {
                    println!("{:<20} {description}", "");
                }
            }
        }
        Commands::Query {
            load,
            minute,
            limit,
            json,
        } => {
            let engine = load_engine(&load, &multi)?;

            let start = Instant::now();
            let snapshot = engine.query_minute(minute)?;
            log::info!("Query finished in {:?}", start.elapsed());

            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print!("{}", report::station_table(&snapshot, limit));
            }
        }
        Commands::Profile { load } => {
            let engine = load_engine(&load, &multi)?;

            let progress = IndicatifProgress::steps_bar(&multi, "Querying hours", 24);
            let start = Instant::now();
            let mut lines = Vec::with_capacity(24);

            for hour in 0..24 {
                let filter = TimeFilter::Centered(MinuteOfDay::from_hm(hour, 0)?);
                let snapshot = engine.query(filter)?;
                lines.push(report::profile_line(hour, &snapshot));
                progress.inc(1);
            }
            progress.finish_and_clear();

            log::info!(
                "Ran 24 queries ({} strategy) in {:.1}ms",
                engine.config().strategy,
                start.elapsed().as_secs_f64() * 1000.0
            );

            println!(
                "HOUR   {:>8} {:>8}   (+/-{} min)",
                "DEP",
                "ARR",
                engine.config().half_width_minutes
            );
            for line in lines {
                println!("{line}");
            }
        }
    }

    Ok(())
}
