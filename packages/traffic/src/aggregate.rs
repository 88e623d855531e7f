//! Per-station rollup of selected trips.
//!
//! Counts are left-joined onto the station list: every station comes back
//! exactly once, in input order, with zero counts if nothing matched. Trips
//! naming a station that is not in the list are orphans and count toward no
//! station; they are only reported in aggregate.

use std::collections::{BTreeSet, HashMap};

use bike_map_traffic_models::{StationTraffic, TrafficSnapshot};
use bike_map_trip_models::{Station, TimeFilter, TripEvent};

use crate::bucket::BucketKind;

/// Station counts plus totals for one selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    /// Every input station with its counts, in input order.
    pub stations: Vec<StationTraffic>,
    /// Departures considered, including orphans.
    pub selected_departures: u64,
    /// Arrivals considered, including orphans.
    pub selected_arrivals: u64,
    /// Departures from stations missing from the list.
    pub orphaned_departures: u64,
    /// Arrivals at stations missing from the list.
    pub orphaned_arrivals: u64,
}

impl Aggregation {
    /// Wraps the counts into the snapshot handed to the renderer.
    #[must_use]
    pub fn into_snapshot(self, filter: TimeFilter, half_width_minutes: u16) -> TrafficSnapshot {
        TrafficSnapshot {
            filter,
            half_width_minutes,
            stations: self.stations,
            selected_departures: self.selected_departures,
            selected_arrivals: self.selected_arrivals,
            orphaned_departures: self.orphaned_departures,
            orphaned_arrivals: self.orphaned_arrivals,
        }
    }
}

/// Counts trips per station id for one side of the trip.
fn count_by_station<'a, I>(trips: I, kind: BucketKind) -> (HashMap<&'a str, u64>, u64)
where
    I: IntoIterator<Item = &'a TripEvent>,
{
    let mut counts: HashMap<&'a str, u64> = HashMap::new();
    let mut total = 0;

    for trip in trips {
        *counts.entry(kind.station_id(trip)).or_insert(0) += 1;
        total += 1;
    }

    (counts, total)
}

/// Sums counts for station ids that are not in `known`.
fn orphaned(counts: &HashMap<&str, u64>, known: &BTreeSet<&str>) -> u64 {
    counts
        .iter()
        .filter(|(id, _)| !known.contains(*id))
        .map(|(_, n)| n)
        .sum()
}

/// Rolls up selected departures by start station and selected arrivals by
/// end station, and joins the counts onto `stations`.
///
/// Runs in time linear in the number of trips plus stations. The result is
/// independent of the order trips are supplied in.
pub fn aggregate<'a, D, A>(stations: &[Station], departures: D, arrivals: A) -> Aggregation
where
    D: IntoIterator<Item = &'a TripEvent>,
    A: IntoIterator<Item = &'a TripEvent>,
{
    let (departure_counts, selected_departures) =
        count_by_station(departures, BucketKind::Departures);
    let (arrival_counts, selected_arrivals) = count_by_station(arrivals, BucketKind::Arrivals);

    let rows: Vec<StationTraffic> = stations
        .iter()
        .map(|station| {
            let id = station.id.as_str();
            StationTraffic::new(
                station.clone(),
                departure_counts.get(id).copied().unwrap_or(0),
                arrival_counts.get(id).copied().unwrap_or(0),
            )
        })
        .collect();

    let known: BTreeSet<&str> = stations.iter().map(|s| s.id.as_str()).collect();
    let orphaned_departures = orphaned(&departure_counts, &known);
    let orphaned_arrivals = orphaned(&arrival_counts, &known);

    if orphaned_departures > 0 || orphaned_arrivals > 0 {
        log::debug!(
            "{orphaned_departures} departures and {orphaned_arrivals} arrivals reference unknown stations"
        );
    }

    Aggregation {
        stations: rows,
        selected_departures,
        selected_arrivals,
        orphaned_departures,
        orphaned_arrivals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{index_of, station};

    #[test]
    fn counts_both_directions() {
        let index = index_of(&[
            ("1", "2", "08:00", "08:10"),
            ("1", "3", "08:05", "08:20"),
            ("3", "1", "09:00", "09:30"),
        ]);
        let stations = vec![station("1"), station("2"), station("3")];
        let result = aggregate(&stations, index.trips(), index.trips());

        let counts: Vec<(u64, u64, u64)> = result
            .stations
            .iter()
            .map(|s| (s.departures(), s.arrivals(), s.total_traffic()))
            .collect();
        assert_eq!(counts, vec![(2, 1, 3), (0, 1, 1), (1, 1, 2)]);
        assert_eq!(result.selected_departures, 3);
        assert_eq!(result.selected_arrivals, 3);
    }

    #[test]
    fn keeps_stations_without_trips() {
        let index = index_of(&[("1", "1", "08:00", "08:10")]);
        let stations = vec![station("9"), station("1"), station("5")];
        let result = aggregate(&stations, index.trips(), index.trips());

        let ids: Vec<&str> = result.stations.iter().map(|s| s.station.id.as_str()).collect();
        assert_eq!(ids, vec!["9", "1", "5"]);
        assert_eq!(result.stations[0].total_traffic(), 0);
        assert_eq!(result.stations[2].total_traffic(), 0);
        assert_eq!(result.stations[1].total_traffic(), 2);
    }

    #[test]
    fn orphans_count_toward_nothing() {
        let index = index_of(&[
            ("1", "ghost", "08:00", "08:10"),
            ("ghost", "1", "08:00", "08:10"),
            ("ghost", "phantom", "08:00", "08:10"),
        ]);
        let stations = vec![station("1")];
        let result = aggregate(&stations, index.trips(), index.trips());

        assert_eq!(result.stations.len(), 1);
        assert_eq!(result.stations[0].departures(), 1);
        assert_eq!(result.stations[0].arrivals(), 1);
        assert_eq!(result.orphaned_departures, 2);
        assert_eq!(result.orphaned_arrivals, 2);
        assert!(result.stations.iter().all(|s| s.station.id != "ghost"));
    }

    #[test]
    fn empty_selection_is_all_zero() {
        let stations = vec![station("1"), station("2")];
        let result = aggregate(&stations, std::iter::empty(), std::iter::empty());
        assert!(result.stations.iter().all(|s| s.total_traffic() == 0));
        assert!(
            result
                .stations
                .iter()
                .all(|s| (s.departure_ratio() - 0.5).abs() < f64::EPSILON)
        );
        assert_eq!(result.selected_departures, 0);
    }

    #[test]
    fn order_of_trips_does_not_matter() {
        let index = index_of(&[
            ("1", "2", "08:00", "08:10"),
            ("2", "3", "10:00", "10:10"),
            ("3", "1", "12:00", "12:10"),
            ("1", "3", "14:00", "14:10"),
        ]);
        let stations = vec![station("1"), station("2"), station("3")];
        let forward = aggregate(&stations, index.trips(), index.trips());
        let backward = aggregate(
            &stations,
            index.trips().iter().rev(),
            index.trips().iter().rev(),
        );
        assert_eq!(forward, backward);
    }

    #[test]
    fn matches_unrestricted_sum() {
        let index = index_of(&[
            ("1", "2", "00:05", "00:10"),
            ("2", "1", "23:58", "00:02"),
            ("2", "2", "06:00", "06:30"),
        ]);
        let stations = vec![station("1"), station("2")];
        let result = aggregate(&stations, index.trips(), index.trips());

        for row in &result.stations {
            let id = row.station.id.as_str();
            let departures = index
                .trips()
                .iter()
                .filter(|t| t.start_station_id == id)
                .count() as u64;
            let arrivals = index
                .trips()
                .iter()
                .filter(|t| t.end_station_id == id)
                .count() as u64;
            assert_eq!(row.departures(), departures);
            assert_eq!(row.arrivals(), arrivals);
            assert_eq!(row.total_traffic(), departures + arrivals);
        }
    }
}
