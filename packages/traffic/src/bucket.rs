//! Per-minute trip buckets.
//!
//! Every ingested trip is stored once in an owned arena and referenced by
//! index from exactly one departure bucket (its start minute) and exactly
//! one arrival bucket (its end minute). Writes are only possible through
//! [`TripIndexBuilder`]; [`TripIndexBuilder::build`] freezes the result into
//! a read-only [`TripIndex`].

use bike_map_traffic_models::IngestReport;
use bike_map_trip_models::{MINUTES_PER_DAY, MinuteOfDay, RawTrip, TripEvent};
use thiserror::Error;

use crate::parsing::parse_wall_clock;
use crate::window::MinuteWindow;

/// A trip timestamp that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field} timestamp '{value}'")]
pub struct ParseError {
    /// Which timestamp was rejected (`"started_at"` or `"ended_at"`).
    pub field: &'static str,
    /// The offending source text.
    pub value: String,
}

/// Which side of a trip a bucket set indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketKind {
    /// Bucketed by start minute, grouped by start station.
    Departures,
    /// Bucketed by end minute, grouped by end station.
    Arrivals,
}

impl BucketKind {
    /// The station a trip counts toward for this kind.
    #[must_use]
    pub fn station_id(self, trip: &TripEvent) -> &str {
        match self {
            Self::Departures => &trip.start_station_id,
            Self::Arrivals => &trip.end_station_id,
        }
    }

    /// The minute a trip is filed under for this kind.
    #[must_use]
    pub fn minute(self, trip: &TripEvent) -> MinuteOfDay {
        match self {
            Self::Departures => trip.start_minute(),
            Self::Arrivals => trip.end_minute(),
        }
    }
}

/// Exactly 1440 buckets of trip indices, one per minute of day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinuteBuckets {
    buckets: Vec<Vec<usize>>,
}

impl MinuteBuckets {
    fn new() -> Self {
        Self {
            buckets: vec![Vec::new(); usize::from(MINUTES_PER_DAY)],
        }
    }

    fn push(&mut self, minute: MinuteOfDay, trip: usize) {
        self.buckets[minute.index()].push(trip);
    }

    /// Trip indices filed under a single minute.
    #[must_use]
    pub fn bucket(&self, minute: MinuteOfDay) -> &[usize] {
        &self.buckets[minute.index()]
    }

    /// All 1440 buckets in minute order.
    pub fn iter(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.buckets.iter().map(Vec::as_slice)
    }

    /// Number of trip references across all buckets.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// Trip indices inside `window`, bucket by bucket in window order.
    pub fn select(&self, window: MinuteWindow) -> impl Iterator<Item = usize> + '_ {
        window
            .ranges()
            .into_iter()
            .flat_map(move |range| self.buckets[range].iter().flatten().copied())
    }
}

/// Read-only minute-of-day index over a batch of trips.
#[derive(Debug, Clone)]
pub struct TripIndex {
    trips: Vec<TripEvent>,
    departures: MinuteBuckets,
    arrivals: MinuteBuckets,
}

impl TripIndex {
    /// Starts a bulk load.
    #[must_use]
    pub fn builder() -> TripIndexBuilder {
        TripIndexBuilder::new()
    }

    /// Every ingested trip, in ingestion order.
    #[must_use]
    pub fn trips(&self) -> &[TripEvent] {
        &self.trips
    }

    /// Number of ingested trips.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trips.len()
    }

    /// Whether no trips were ingested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    /// The bucket set for one side of the trips.
    #[must_use]
    pub const fn buckets(&self, kind: BucketKind) -> &MinuteBuckets {
        match kind {
            BucketKind::Departures => &self.departures,
            BucketKind::Arrivals => &self.arrivals,
        }
    }

    /// Departure buckets, indexed by start minute.
    #[must_use]
    pub const fn departures(&self) -> &MinuteBuckets {
        &self.departures
    }

    /// Arrival buckets, indexed by end minute.
    #[must_use]
    pub const fn arrivals(&self) -> &MinuteBuckets {
        &self.arrivals
    }

    /// Trips of the given kind whose bucket lies inside `window`.
    pub fn select(
        &self,
        kind: BucketKind,
        window: MinuteWindow,
    ) -> impl Iterator<Item = &TripEvent> + '_ {
        self.buckets(kind)
            .select(window)
            .map(move |i| &self.trips[i])
    }
}

/// Parses a raw trip's timestamps.
///
/// # Errors
///
/// Returns [`ParseError`] naming the first timestamp that is not a valid
/// wall-clock date and time.
pub fn parse_trip(raw: RawTrip) -> Result<TripEvent, ParseError> {
    let Some(started_at) = parse_wall_clock(&raw.started_at) else {
        return Err(ParseError {
            field: "started_at",
            value: raw.started_at,
        });
    };
    let Some(ended_at) = parse_wall_clock(&raw.ended_at) else {
        return Err(ParseError {
            field: "ended_at",
            value: raw.ended_at,
        });
    };

    Ok(TripEvent {
        start_station_id: raw.start_station_id,
        end_station_id: raw.end_station_id,
        started_at,
        ended_at,
    })
}

/// Mutable bulk-load phase of a [`TripIndex`].
#[derive(Debug)]
pub struct TripIndexBuilder {
    index: TripIndex,
    report: IngestReport,
}

impl Default for TripIndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TripIndexBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            index: TripIndex {
                trips: Vec::new(),
                departures: MinuteBuckets::new(),
                arrivals: MinuteBuckets::new(),
            },
            report: IngestReport::default(),
        }
    }

    /// Parses one raw trip and files it into its departure and arrival
    /// buckets.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if either timestamp is malformed. The trip is
    /// then not stored anywhere and the builder remains usable.
    pub fn ingest(&mut self, raw: RawTrip) -> Result<&TripEvent, ParseError> {
        let trip = match parse_trip(raw) {
            Ok(trip) => trip,
            Err(e) => {
                self.report.skipped += 1;
                return Err(e);
            }
        };

        let i = self.index.trips.len();
        self.index.departures.push(trip.start_minute(), i);
        self.index.arrivals.push(trip.end_minute(), i);
        self.index.trips.push(trip);
        self.report.ingested += 1;

        Ok(&self.index.trips[i])
    }

    /// Ingests every record, skipping (and logging) malformed ones.
    ///
    /// Returns the counts for this batch only.
    pub fn ingest_all<I>(&mut self, records: I) -> IngestReport
    where
        I: IntoIterator<Item = RawTrip>,
    {
        let mut batch = IngestReport::default();

        for raw in records {
            match self.ingest(raw) {
                Ok(_) => batch.ingested += 1,
                Err(e) => {
                    log::warn!("Skipping trip: {e}");
                    batch.skipped += 1;
                }
            }
        }

        batch
    }

    /// Running totals since the builder was created.
    #[must_use]
    pub const fn report(&self) -> IngestReport {
        self.report
    }

    /// Finishes the bulk load.
    #[must_use]
    pub fn build(self) -> TripIndex {
        log::info!(
            "Indexed {} trips into {} minute buckets ({} skipped)",
            self.report.ingested,
            MINUTES_PER_DAY,
            self.report.skipped
        );
        self.index
    }
}
