#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Minute-of-day trip bucketing and circular-window traffic aggregation.
//!
//! Trips are bulk-loaded once into a [`TripIndex`], which files every trip
//! into one of 1440 departure buckets and one of 1440 arrival buckets. After
//! that the index is read-only. Each filter change on the map then runs a
//! [`query`] (or [`TrafficEngine::query`]): select the buckets inside a
//! circular window around the chosen minute, count trips per station, and
//! left-join the counts onto the station list.

pub mod aggregate;
pub mod bucket;
pub mod engine;
pub mod gate;
pub mod parsing;
pub mod prefix;
pub mod window;

pub use aggregate::{Aggregation, aggregate};
pub use bucket::{BucketKind, MinuteBuckets, ParseError, TripIndex, TripIndexBuilder};
pub use engine::{TrafficEngine, query};
pub use gate::{QueryGate, QueryTicket};
pub use prefix::CumulativeTraffic;
pub use window::{MinuteWindow, select};

use bike_map_trip_models::InvalidMinuteError;
use thiserror::Error;

/// Errors that can occur while building or querying traffic.
#[derive(Debug, Error)]
pub enum TrafficError {
    /// A caller-supplied value was out of range. Raised before any bucket
    /// is touched.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of what was rejected.
        message: String,
    },

    /// A trip timestamp could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl From<InvalidMinuteError> for TrafficError {
    fn from(e: InvalidMinuteError) -> Self {
        Self::InvalidArgument {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use bike_map_trip_models::{RawTrip, Station};

    use crate::{TripIndex, TripIndexBuilder};

    pub fn station(id: &str) -> Station {
        Station {
            id: id.to_string(),
            name: format!("Station {id}"),
            longitude: -71.09,
            latitude: 42.36,
        }
    }

    pub fn raw(start: &str, end: &str, started_at: &str, ended_at: &str) -> RawTrip {
        RawTrip {
            start_station_id: start.to_string(),
            end_station_id: end.to_string(),
            started_at: started_at.to_string(),
            ended_at: ended_at.to_string(),
        }
    }

    /// Builds an index with one trip per `(start, end, start_hhmm, end_hhmm)`.
    pub fn index_of(trips: &[(&str, &str, &str, &str)]) -> TripIndex {
        let mut builder = TripIndexBuilder::new();
        for (start, end, started, ended) in trips {
            builder
                .ingest(raw(
                    start,
                    end,
                    &format!("2024-03-01 {started}:00"),
                    &format!("2024-03-01 {ended}:00"),
                ))
                .unwrap();
        }
        builder.build()
    }

    /// Stations A (id 1) and B (id 2) with one trip each way across midnight.
    pub fn midnight_fixture() -> (Vec<Station>, TripIndex) {
        let stations = vec![station("1"), station("2")];
        let index = index_of(&[("1", "2", "00:05", "00:10"), ("2", "1", "23:58", "00:02")]);
        (stations, index)
    }
}
