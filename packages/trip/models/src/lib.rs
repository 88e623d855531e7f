#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Canonical trip, station, and time-of-day types.
//!
//! Every data source (bike share exports, station feeds, etc.) is normalized
//! into these shapes before it reaches the traffic engine. The engine never
//! sees source-specific field names.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Number of minutes in a day. Minute-of-day values are `0..MINUTES_PER_DAY`.
pub const MINUTES_PER_DAY: u16 = 1440;

/// Raw filter value meaning "no temporal filter".
pub const UNFILTERED_SENTINEL: i32 = -1;

/// A wall-clock time of day with minute resolution, in `0..=1439`.
///
/// Calendar date and timezone are dropped: two timestamps on
/// different days with the same hour and minute map to the same value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u16", into = "u16")]
pub struct MinuteOfDay(u16);

impl MinuteOfDay {
    /// Midnight (`00:00`).
    pub const MIDNIGHT: Self = Self(0);

    /// Noon (`12:00`).
    pub const NOON: Self = Self(720);

    /// Creates a minute-of-day from its numeric value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in the range 0-1439.
    pub const fn new(value: u16) -> Result<Self, InvalidMinuteError> {
        if value < MINUTES_PER_DAY {
            Ok(Self(value))
        } else {
            Err(InvalidMinuteError {
                value: value as i32,
            })
        }
    }

    /// Creates a minute-of-day from an hour (0-23) and minute (0-59).
    ///
    /// # Errors
    ///
    /// Returns an error if either component is out of range.
    pub const fn from_hm(hour: u16, minute: u16) -> Result<Self, InvalidMinuteError> {
        if hour >= 24 || minute >= 60 {
            return Err(InvalidMinuteError {
                value: hour as i32 * 60 + minute as i32,
            });
        }
        Ok(Self(hour * 60 + minute))
    }

    /// Extracts the wall-clock hour and minute of any `chrono` time value.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn of<T: Timelike>(time: &T) -> Self {
        // hour() < 24 and minute() < 60 are guaranteed by chrono
        Self((time.hour() * 60 + time.minute()) as u16)
    }

    /// Returns the numeric value (0-1439).
    #[must_use]
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Returns the value as a bucket index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the wall-clock hour (0-23).
    #[must_use]
    pub const fn hour(self) -> u16 {
        self.0 / 60
    }

    /// Returns the wall-clock minute within the hour (0-59).
    #[must_use]
    pub const fn minute(self) -> u16 {
        self.0 % 60
    }
}

impl TryFrom<u16> for MinuteOfDay {
    type Error = InvalidMinuteError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MinuteOfDay> for u16 {
    fn from(value: MinuteOfDay) -> Self {
        value.0
    }
}

impl std::fmt::Display for MinuteOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// Error returned when a value cannot be used as a minute of day or filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidMinuteError {
    /// The rejected value.
    pub value: i32,
}

impl std::fmt::Display for InvalidMinuteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid minute of day {}: expected -1 (unfiltered) or 0-1439",
            self.value
        )
    }
}

impl std::error::Error for InvalidMinuteError {}

/// The time-of-day filter applied to a traffic query.
///
/// On the wire this is the raw slider value: `-1` for [`Self::Unfiltered`],
/// otherwise the center minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum TimeFilter {
    /// Include every trip regardless of time of day.
    #[default]
    Unfiltered,
    /// Include trips within the window centered on this minute.
    Centered(MinuteOfDay),
}

impl TimeFilter {
    /// Returns the center minute, if any.
    #[must_use]
    pub const fn center(self) -> Option<MinuteOfDay> {
        match self {
            Self::Unfiltered => None,
            Self::Centered(minute) => Some(minute),
        }
    }

    /// Returns the raw slider value (`-1` when unfiltered).
    #[must_use]
    pub fn as_raw(self) -> i32 {
        match self {
            Self::Unfiltered => UNFILTERED_SENTINEL,
            Self::Centered(minute) => i32::from(minute.value()),
        }
    }
}

impl TryFrom<i32> for TimeFilter {
    type Error = InvalidMinuteError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        if value == UNFILTERED_SENTINEL {
            return Ok(Self::Unfiltered);
        }
        u16::try_from(value)
            .ok()
            .and_then(|v| MinuteOfDay::new(v).ok())
            .map(Self::Centered)
            .ok_or(InvalidMinuteError { value })
    }
}

impl From<TimeFilter> for i32 {
    fn from(value: TimeFilter) -> Self {
        value.as_raw()
    }
}

impl std::fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unfiltered => write!(f, "all day"),
            Self::Centered(minute) => write!(f, "around {minute}"),
        }
    }
}

/// A trip record after source normalization but before timestamp parsing.
///
/// Produced by the source adapters; consumed by the bucketer, which is
/// responsible for rejecting unparseable timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTrip {
    /// Station the trip started at.
    pub start_station_id: String,
    /// Station the trip ended at.
    pub end_station_id: String,
    /// Start timestamp as it appeared in the source.
    pub started_at: String,
    /// End timestamp as it appeared in the source.
    pub ended_at: String,
}

/// A parsed trip between two stations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripEvent {
    /// Station the trip started at (a departure from this station).
    pub start_station_id: String,
    /// Station the trip ended at (an arrival at this station).
    pub end_station_id: String,
    /// Wall-clock start time.
    pub started_at: NaiveDateTime,
    /// Wall-clock end time.
    pub ended_at: NaiveDateTime,
}

impl TripEvent {
    /// Minute of day the trip departed.
    #[must_use]
    pub fn start_minute(&self) -> MinuteOfDay {
        MinuteOfDay::of(&self.started_at)
    }

    /// Minute of day the trip arrived.
    #[must_use]
    pub fn end_minute(&self) -> MinuteOfDay {
        MinuteOfDay::of(&self.ended_at)
    }
}

/// A docking station shown on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    /// Stable identifier trips refer to (e.g. `"A32000"` or `"3"`).
    pub id: String,
    /// Human-readable station name.
    pub name: String,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Latitude (WGS84).
    pub latitude: f64,
}
