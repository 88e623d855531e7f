#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Schema-driven loading of bike share exports.
//!
//! Station lists and trip files from different systems (and different eras
//! of the same system) name their columns differently. A [`SourceSchema`]
//! maps those columns onto the canonical [`bike_map_trip_models::Station`]
//! and [`bike_map_trip_models::RawTrip`] so the traffic engine never sees
//! source-specific field names.

pub mod csv_records;
pub mod parsing;
pub mod progress;
pub mod registry;
pub mod schema;
pub mod stations;
pub mod trips;

pub use registry::{all_schemas, find_schema};
pub use schema::{SourceSchema, parse_schema_toml};
pub use stations::{load_stations, read_stations};
pub use trips::{TripBatch, load_trips, read_trips};

/// Errors that can occur while loading exports or schemas.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// I/O error (file open/read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A schema was malformed or did not match the input.
    #[error("Schema error: {message}")]
    Schema {
        /// Description of what went wrong.
        message: String,
    },

    /// No embedded schema has the requested id.
    #[error("Unknown schema: {id}")]
    UnknownSchema {
        /// The id that was requested.
        id: String,
    },
}
