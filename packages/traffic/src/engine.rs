//! Query entry points.
//!
//! [`query`] is the stateless form: validate the filter, select the window,
//! aggregate. [`TrafficEngine`] owns the index and station list for a
//! session and can answer through the prefix tables instead of scanning.
//! Both return a fresh [`TrafficSnapshot`] per call and never modify the
//! index.

use std::time::Instant;

use bike_map_traffic_models::{AggregationStrategy, TrafficConfig, TrafficSnapshot};
use bike_map_trip_models::{Station, TimeFilter};

use crate::TrafficError;
use crate::aggregate::aggregate;
use crate::bucket::{BucketKind, TripIndex};
use crate::prefix::CumulativeTraffic;
use crate::window::MinuteWindow;

/// Computes station traffic for the window around `center_minute`
/// (`-1` for no filter) by scanning the selected buckets.
///
/// # Errors
///
/// Returns [`TrafficError::InvalidArgument`] if `center_minute` is outside
/// `[-1, 1439]` or `half_width` exceeds 1440. Validation happens before any
/// bucket is read.
pub fn query(
    stations: &[Station],
    index: &TripIndex,
    center_minute: i32,
    half_width: u16,
) -> Result<TrafficSnapshot, TrafficError> {
    let filter = TimeFilter::try_from(center_minute)?;
    scan(stations, index, filter, half_width)
}

fn scan(
    stations: &[Station],
    index: &TripIndex,
    filter: TimeFilter,
    half_width: u16,
) -> Result<TrafficSnapshot, TrafficError> {
    let window = MinuteWindow::new(filter, half_width)?;
    let aggregation = aggregate(
        stations,
        index.select(BucketKind::Departures, window),
        index.select(BucketKind::Arrivals, window),
    );
    Ok(aggregation.into_snapshot(filter, half_width))
}

/// A loaded session: trips, stations, and query configuration.
///
/// Construct once after the bulk load; every filter change then calls
/// [`TrafficEngine::query`].
#[derive(Debug, Clone)]
pub struct TrafficEngine {
    index: TripIndex,
    stations: Vec<Station>,
    config: TrafficConfig,
    cumulative: Option<CumulativeTraffic>,
}

impl TrafficEngine {
    /// Creates an engine, building prefix tables when the configured
    /// strategy needs them.
    ///
    /// # Errors
    ///
    /// Returns [`TrafficError::InvalidArgument`] if the configured
    /// half-width is out of range.
    pub fn new(
        index: TripIndex,
        stations: Vec<Station>,
        config: TrafficConfig,
    ) -> Result<Self, TrafficError> {
        // validate up front so queries can only fail on their own input
        MinuteWindow::new(TimeFilter::Unfiltered, config.half_width_minutes)?;

        let cumulative = match config.strategy {
            AggregationStrategy::Scan => None,
            AggregationStrategy::Prefix => Some(CumulativeTraffic::build(&index, &stations)),
        };

        log::info!(
            "Traffic engine ready: {} trips, {} stations, {} strategy, +/-{} min window",
            index.len(),
            stations.len(),
            config.strategy,
            config.half_width_minutes
        );

        Ok(Self {
            index,
            stations,
            config,
            cumulative,
        })
    }

    /// The trip index.
    #[must_use]
    pub const fn index(&self) -> &TripIndex {
        &self.index
    }

    /// The station list, in output order.
    #[must_use]
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> TrafficConfig {
        self.config
    }

    /// Computes station traffic for `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`TrafficError::InvalidArgument`] if the window cannot be
    /// built from the configured half-width.
    pub fn query(&self, filter: TimeFilter) -> Result<TrafficSnapshot, TrafficError> {
        let start = Instant::now();
        let half_width = self.config.half_width_minutes;

        let snapshot = match &self.cumulative {
            None => scan(&self.stations, &self.index, filter, half_width)?,
            Some(cumulative) => {
                let window = MinuteWindow::new(filter, half_width)?;
                cumulative
                    .aggregate(window)
                    .into_snapshot(filter, half_width)
            }
        };

        log::debug!(
            "Query {filter}: {} departures, {} arrivals in {:?}",
            snapshot.selected_departures,
            snapshot.selected_arrivals,
            start.elapsed()
        );

        Ok(snapshot)
    }

    /// Computes station traffic for a raw slider value (`-1` for all day).
    ///
    /// # Errors
    ///
    /// Returns [`TrafficError::InvalidArgument`] if `center_minute` is
    /// outside `[-1, 1439]`.
    pub fn query_minute(&self, center_minute: i32) -> Result<TrafficSnapshot, TrafficError> {
        self.query(TimeFilter::try_from(center_minute)?)
    }
}

#[cfg(test)]
mod tests {
    use bike_map_trip_models::MinuteOfDay;

    use super::*;
    use crate::test_support::{index_of, midnight_fixture, station};

    fn counts(snapshot: &TrafficSnapshot, id: &str) -> (u64, u64, u64) {
        let s = snapshot.station(id).unwrap();
        (s.departures(), s.arrivals(), s.total_traffic())
    }

    fn engines() -> Vec<TrafficEngine> {
        [AggregationStrategy::Scan, AggregationStrategy::Prefix]
            .into_iter()
            .map(|strategy| {
                let (stations, index) = midnight_fixture();
                let config = TrafficConfig {
                    strategy,
                    ..TrafficConfig::default()
                };
                TrafficEngine::new(index, stations, config).unwrap()
            })
            .collect()
    }

    #[test]
    fn unfiltered_counts_every_trip() {
        let (stations, index) = midnight_fixture();
        let snapshot = query(&stations, &index, -1, 60).unwrap();
        assert_eq!(counts(&snapshot, "1"), (1, 1, 2));
        assert_eq!(counts(&snapshot, "2"), (1, 1, 2));
        assert_eq!(snapshot.filter, TimeFilter::Unfiltered);
    }

    #[test]
    fn midnight_window_includes_both_trips() {
        let (stations, index) = midnight_fixture();
        let snapshot = query(&stations, &index, 0, 60).unwrap();
        assert_eq!(counts(&snapshot, "1"), (1, 1, 2));
        assert_eq!(counts(&snapshot, "2"), (1, 1, 2));
    }

    #[test]
    fn noon_window_is_empty() {
        let (stations, index) = midnight_fixture();
        let snapshot = query(&stations, &index, 720, 60).unwrap();
        assert_eq!(counts(&snapshot, "1"), (0, 0, 0));
        assert_eq!(counts(&snapshot, "2"), (0, 0, 0));
        assert_eq!(snapshot.stations.len(), 2);
    }

    #[test]
    fn strategies_agree_on_end_to_end_scenario() {
        for engine in engines() {
            let strategy = engine.config().strategy;
            let all = engine.query_minute(-1).unwrap();
            assert_eq!(counts(&all, "1"), (1, 1, 2), "{strategy}");
            assert_eq!(counts(&all, "2"), (1, 1, 2), "{strategy}");

            let midnight = engine
                .query(TimeFilter::Centered(MinuteOfDay::MIDNIGHT))
                .unwrap();
            assert_eq!(counts(&midnight, "1"), (1, 1, 2), "{strategy}");
            assert_eq!(counts(&midnight, "2"), (1, 1, 2), "{strategy}");

            let noon = engine.query(TimeFilter::Centered(MinuteOfDay::NOON)).unwrap();
            assert_eq!(noon.total_traffic(), 0, "{strategy}");
        }
    }

    #[test]
    fn repeated_queries_are_identical() {
        for engine in engines() {
            let first = engine.query_minute(5).unwrap();
            for _ in 0..3 {
                assert_eq!(engine.query_minute(5).unwrap(), first);
            }
            // an intervening query must not leak into the next one
            engine.query_minute(720).unwrap();
            assert_eq!(engine.query_minute(5).unwrap(), first);
        }
    }

    #[test]
    fn rejects_invalid_filter_values() {
        let engine = engines().remove(0);
        for bad in [-2, 1440, 5000, i32::MIN] {
            assert!(matches!(
                engine.query_minute(bad),
                Err(TrafficError::InvalidArgument { .. })
            ));
        }
        let (stations, index) = midnight_fixture();
        assert!(query(&stations, &index, 1440, 60).is_err());
    }

    #[test]
    fn rejects_invalid_half_width() {
        let (stations, index) = midnight_fixture();
        let config = TrafficConfig {
            half_width_minutes: 2000,
            ..TrafficConfig::default()
        };
        assert!(TrafficEngine::new(index, stations, config).is_err());
    }

    #[test]
    fn empty_trip_set_reports_zero() {
        let index = index_of(&[]);
        let stations = vec![station("1"), station("2")];
        let engine = TrafficEngine::new(index, stations, TrafficConfig::default()).unwrap();
        let snapshot = engine.query_minute(-1).unwrap();
        assert_eq!(snapshot.stations.len(), 2);
        assert_eq!(snapshot.total_traffic(), 0);
        assert_eq!(snapshot.selected_departures, 0);
    }

    #[test]
    fn snapshot_reports_orphans() {
        let index = index_of(&[("1", "gone", "08:00", "08:05")]);
        let engine =
            TrafficEngine::new(index, vec![station("1")], TrafficConfig::default()).unwrap();
        let snapshot = engine.query_minute(480).unwrap();
        assert_eq!(snapshot.orphaned_arrivals, 1);
        assert_eq!(snapshot.orphaned_departures, 0);
        assert_eq!(counts(&snapshot, "1"), (1, 0, 1));
    }
}
