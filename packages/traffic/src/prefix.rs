//! Cumulative per-station minute counts.
//!
//! For each station (plus one catch-all row for unknown ids) this keeps
//! `cumulative[m]` = trips filed before minute `m`, for `m` in `0..=1440`.
//! A window count is then one subtraction per range, so a query costs
//! O(stations) no matter how many trips were loaded. Built once from a
//! [`TripIndex`]; produces the same [`Aggregation`] as a scan.

use std::collections::HashMap;

use bike_map_traffic_models::StationTraffic;
use bike_map_trip_models::{MINUTES_PER_DAY, Station};

use crate::aggregate::Aggregation;
use crate::bucket::{BucketKind, TripIndex};
use crate::window::MinuteWindow;

const COLUMNS: usize = MINUTES_PER_DAY as usize + 1;

/// Prefix sums for one bucket kind, one row per distinct station id.
#[derive(Debug, Clone)]
struct CumulativeCounts {
    counts: Vec<u64>,
}

impl CumulativeCounts {
    fn build(
        index: &TripIndex,
        kind: BucketKind,
        row_of: &HashMap<&str, usize>,
        rows: usize,
    ) -> Self {
        let mut counts = vec![0u64; rows * COLUMNS];
        let orphan_row = rows - 1;

        for (minute, bucket) in index.buckets(kind).iter().enumerate() {
            for &i in bucket {
                let id = kind.station_id(&index.trips()[i]);
                let row = row_of.get(id).copied().unwrap_or(orphan_row);
                counts[row * COLUMNS + minute + 1] += 1;
            }
        }

        for row in counts.chunks_exact_mut(COLUMNS) {
            for m in 1..COLUMNS {
                row[m] += row[m - 1];
            }
        }

        Self { counts }
    }

    fn window_count(&self, row: usize, window: MinuteWindow) -> u64 {
        let cumulative = &self.counts[row * COLUMNS..(row + 1) * COLUMNS];
        window
            .ranges()
            .iter()
            .map(|r| cumulative[r.end] - cumulative[r.start])
            .sum()
    }
}

/// Precomputed windowed counts for a fixed station list.
#[derive(Debug, Clone)]
pub struct CumulativeTraffic {
    stations: Vec<Station>,
    /// Row for each entry of `stations` (duplicate ids share a row).
    station_rows: Vec<usize>,
    rows: usize,
    departures: CumulativeCounts,
    arrivals: CumulativeCounts,
}

impl CumulativeTraffic {
    /// Builds the prefix tables for `stations` from a finished index.
    #[must_use]
    pub fn build(index: &TripIndex, stations: &[Station]) -> Self {
        let mut row_of: HashMap<&str, usize> = HashMap::new();
        let station_rows: Vec<usize> = stations
            .iter()
            .map(|s| {
                let next = row_of.len();
                *row_of.entry(s.id.as_str()).or_insert(next)
            })
            .collect();

        if row_of.len() < stations.len() {
            log::warn!(
                "{} duplicate station ids; duplicates share counts",
                stations.len() - row_of.len()
            );
        }

        // last row collects trips for unknown stations
        let rows = row_of.len() + 1;
        let departures = CumulativeCounts::build(index, BucketKind::Departures, &row_of, rows);
        let arrivals = CumulativeCounts::build(index, BucketKind::Arrivals, &row_of, rows);

        log::debug!(
            "Built cumulative traffic tables for {} stations ({} cells)",
            stations.len(),
            2 * rows * COLUMNS
        );

        Self {
            stations: stations.to_vec(),
            station_rows,
            rows,
            departures,
            arrivals,
        }
    }

    /// The station list the tables were built for.
    #[must_use]
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Windowed counts for every station, equivalent to scanning the
    /// selected buckets and calling [`crate::aggregate`].
    #[must_use]
    pub fn aggregate(&self, window: MinuteWindow) -> Aggregation {
        let orphan_row = self.rows - 1;

        let stations = self
            .stations
            .iter()
            .zip(&self.station_rows)
            .map(|(station, &row)| {
                StationTraffic::new(
                    station.clone(),
                    self.departures.window_count(row, window),
                    self.arrivals.window_count(row, window),
                )
            })
            .collect();

        let total = |counts: &CumulativeCounts| -> u64 {
            (0..self.rows).map(|row| counts.window_count(row, window)).sum()
        };

        Aggregation {
            stations,
            selected_departures: total(&self.departures),
            selected_arrivals: total(&self.arrivals),
            orphaned_departures: self.departures.window_count(orphan_row, window),
            orphaned_arrivals: self.arrivals.window_count(orphan_row, window),
        }
    }
}
