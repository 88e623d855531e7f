#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Traffic query result and configuration types.
//!
//! These are the values handed to the rendering layer after every filter
//! change. They serialize to camelCase JSON so a web map can consume them
//! directly.

use bike_map_trip_models::{Station, TimeFilter};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Default half-width of the time-of-day window, giving a two hour window.
pub const DEFAULT_HALF_WIDTH_MINUTES: u16 = 60;

/// Departure ratio reported for stations with no traffic at all.
pub const NEUTRAL_DEPARTURE_RATIO: f64 = 0.5;

/// How windowed counts are computed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AggregationStrategy {
    /// Walk every selected bucket and count trips per station.
    #[default]
    Scan,
    /// Difference per-station cumulative minute counts.
    Prefix,
}

/// Engine configuration, typically loaded from a TOML file.
///
/// ```toml
/// half_width_minutes = 60
/// strategy = "prefix"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficConfig {
    /// Minutes on each side of the selected minute.
    pub half_width_minutes: u16,
    /// Aggregation strategy.
    pub strategy: AggregationStrategy,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            half_width_minutes: DEFAULT_HALF_WIDTH_MINUTES,
            strategy: AggregationStrategy::Scan,
        }
    }
}

/// Coarse classification of a station's traffic direction.
///
/// Splits the departure ratio into three equal bands, matching the three
/// colors of the map legend.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowBalance {
    /// Departure ratio below 1/3.
    MostlyArrivals,
    /// Departure ratio in `[1/3, 2/3)`, including stations with no traffic.
    Balanced,
    /// Departure ratio of 2/3 or more.
    MostlyDepartures,
}

impl FlowBalance {
    /// Classifies a departure ratio in `[0, 1]`.
    #[must_use]
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < 1.0 / 3.0 {
            Self::MostlyArrivals
        } else if ratio < 2.0 / 3.0 {
            Self::Balanced
        } else {
            Self::MostlyDepartures
        }
    }
}

/// A station annotated with traffic counts for one query.
///
/// Counts are only settable through [`StationTraffic::new`], so
/// `total_traffic` always equals `departures + arrivals`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationTraffic {
    /// The station being annotated.
    #[serde(flatten)]
    pub station: Station,
    departures: u64,
    arrivals: u64,
    total_traffic: u64,
}

impl StationTraffic {
    /// Annotates a station with departure and arrival counts.
    #[must_use]
    pub const fn new(station: Station, departures: u64, arrivals: u64) -> Self {
        Self {
            station,
            departures,
            arrivals,
            total_traffic: departures + arrivals,
        }
    }

    /// Trips that started at this station.
    #[must_use]
    pub const fn departures(&self) -> u64 {
        self.departures
    }

    /// Trips that ended at this station.
    #[must_use]
    pub const fn arrivals(&self) -> u64 {
        self.arrivals
    }

    /// Departures plus arrivals.
    #[must_use]
    pub const fn total_traffic(&self) -> u64 {
        self.total_traffic
    }

    /// Share of traffic that departed from this station.
    ///
    /// Returns [`NEUTRAL_DEPARTURE_RATIO`] when the station saw no traffic.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn departure_ratio(&self) -> f64 {
        if self.total_traffic == 0 {
            NEUTRAL_DEPARTURE_RATIO
        } else {
            self.departures as f64 / self.total_traffic as f64
        }
    }

    /// Direction classification derived from [`Self::departure_ratio`].
    #[must_use]
    pub fn flow_balance(&self) -> FlowBalance {
        FlowBalance::from_ratio(self.departure_ratio())
    }
}

/// The result of one traffic query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficSnapshot {
    /// Filter the snapshot was computed for.
    pub filter: TimeFilter,
    /// Window half-width used for the query.
    pub half_width_minutes: u16,
    /// Every input station, in input order.
    pub stations: Vec<StationTraffic>,
    /// Departures inside the window, including orphans.
    pub selected_departures: u64,
    /// Arrivals inside the window, including orphans.
    pub selected_arrivals: u64,
    /// Selected departures whose start station is not in the station list.
    pub orphaned_departures: u64,
    /// Selected arrivals whose end station is not in the station list.
    pub orphaned_arrivals: u64,
}

impl TrafficSnapshot {
    /// Looks up the annotated record for a station id.
    #[must_use]
    pub fn station(&self, id: &str) -> Option<&StationTraffic> {
        self.stations.iter().find(|s| s.station.id == id)
    }

    /// Sum of `total_traffic` over all known stations.
    #[must_use]
    pub fn total_traffic(&self) -> u64 {
        self.stations.iter().map(StationTraffic::total_traffic).sum()
    }

    /// Highest-traffic stations first, ties broken by station id.
    #[must_use]
    pub fn busiest(&self, limit: usize) -> Vec<&StationTraffic> {
        let mut ranked: Vec<&StationTraffic> = self.stations.iter().collect();
        ranked.sort_by(|a, b| {
            b.total_traffic()
                .cmp(&a.total_traffic())
                .then_with(|| a.station.id.cmp(&b.station.id))
        });
        ranked.truncate(limit);
        ranked
    }
}

/// Outcome of a bulk load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    /// Trips placed into buckets.
    pub ingested: u64,
    /// Records rejected (unparseable timestamps).
    pub skipped: u64,
}

impl IngestReport {
    /// Records seen, accepted or not.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.ingested + self.skipped
    }
}
