//! Plain-text rendering of query results.

use std::fmt::Write as _;

use bike_map_traffic_models::TrafficSnapshot;

/// Formats the busiest stations as a fixed-width table, heaviest first.
#[must_use]
pub fn station_table(snapshot: &TrafficSnapshot, limit: usize) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Traffic {} (+/-{} min): {} departures, {} arrivals",
        snapshot.filter,
        snapshot.half_width_minutes,
        snapshot.selected_departures,
        snapshot.selected_arrivals
    );
    if snapshot.orphaned_departures > 0 || snapshot.orphaned_arrivals > 0 {
        let _ = writeln!(
            out,
            "  ({} departures and {} arrivals at stations not in the list)",
            snapshot.orphaned_departures, snapshot.orphaned_arrivals
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "{:<10} {:<36} {:>6} {:>6} {:>6}  FLOW",
        "ID", "NAME", "DEP", "ARR", "TOTAL"
    );
    let _ = writeln!(out, "{}", "-".repeat(80));

    for row in snapshot.busiest(limit) {
        let _ = writeln!(
            out,
            "{:<10} {:<36} {:>6} {:>6} {:>6}  {}",
            row.station.id,
            truncate(&row.station.name, 36),
            row.departures(),
            row.arrivals(),
            row.total_traffic(),
            row.flow_balance()
        );
    }

    out
}

/// One line of the hourly profile.
#[must_use]
pub fn profile_line(hour: u16, snapshot: &TrafficSnapshot) -> String {
    format!(
        "{hour:02}:00  {:>8} {:>8}",
        snapshot.selected_departures, snapshot.selected_arrivals
    )
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(max - 1).collect();
        t.push('…');
        t
    }
}
