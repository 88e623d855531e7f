//! Circular time-of-day window selection.
//!
//! A window centered on minute `c` with half-width `h` covers the half-open
//! range `[c - h, c + h)` modulo 1440. When that range crosses midnight it
//! is split into `[low, 1440)` followed by `[0, high)`. Every covered minute
//! appears exactly once, so the selected trips never double count.

use std::ops::Range;

use bike_map_trip_models::{MINUTES_PER_DAY, MinuteOfDay, TimeFilter, TripEvent};

use crate::TrafficError;
use crate::bucket::{BucketKind, TripIndex};

const DAY: usize = MINUTES_PER_DAY as usize;

/// The set of minutes a query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MinuteWindow {
    /// No filter: every minute in index order.
    All,
    /// `[low, high)` without crossing midnight. Empty when `low == high`.
    Contiguous {
        /// First covered minute.
        low: u16,
        /// First minute past the window.
        high: u16,
    },
    /// `[low, 1440)` then `[0, high)`. Covers the whole day when
    /// `low == high`.
    Wrapped {
        /// First covered minute before midnight.
        low: u16,
        /// First minute past the window after midnight.
        high: u16,
    },
}

impl MinuteWindow {
    /// Resolves a filter and half-width into the covered minutes.
    ///
    /// A half-width of 0 covers nothing; a half-width of 720 or more covers
    /// the whole day exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`TrafficError::InvalidArgument`] if `half_width` exceeds
    /// 1440 minutes.
    pub fn new(filter: TimeFilter, half_width: u16) -> Result<Self, TrafficError> {
        if half_width > MINUTES_PER_DAY {
            return Err(TrafficError::InvalidArgument {
                message: format!(
                    "window half-width {half_width} exceeds {MINUTES_PER_DAY} minutes"
                ),
            });
        }

        let Some(center) = filter.center() else {
            return Ok(Self::All);
        };

        let day = i32::from(MINUTES_PER_DAY);
        let center = i32::from(center.value());
        let half_width = i32::from(half_width);

        // rem_euclid keeps both bounds in 0..1440, so the casts are lossless
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let low = (center - half_width).rem_euclid(day) as u16;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let high = (center + half_width).rem_euclid(day) as u16;

        if 2 * half_width >= day {
            return Ok(Self::Wrapped { low, high: low });
        }

        if low <= high {
            Ok(Self::Contiguous { low, high })
        } else {
            Ok(Self::Wrapped { low, high })
        }
    }

    /// Bucket index ranges in selection order. The second range is empty
    /// unless the window wraps past midnight.
    #[must_use]
    pub fn ranges(self) -> [Range<usize>; 2] {
        match self {
            Self::All => [0..DAY, 0..0],
            Self::Contiguous { low, high } => [usize::from(low)..usize::from(high), 0..0],
            Self::Wrapped { low, high } => [usize::from(low)..DAY, 0..usize::from(high)],
        }
    }

    /// Whether trips filed under `minute` are selected.
    #[must_use]
    pub fn contains(self, minute: MinuteOfDay) -> bool {
        let i = minute.index();
        self.ranges().iter().any(|r| r.contains(&i))
    }

    /// Number of covered minutes.
    #[must_use]
    pub fn len(self) -> usize {
        self.ranges().iter().map(ExactSizeIterator::len).sum()
    }

    /// Whether the window covers no minutes.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Covered minutes in selection order.
    pub fn minutes(self) -> impl Iterator<Item = MinuteOfDay> {
        self.ranges()
            .into_iter()
            .flatten()
            .filter_map(|i| u16::try_from(i).ok())
            .filter_map(|i| MinuteOfDay::new(i).ok())
    }
}

/// Returns the trips of one kind that fall inside the window around
/// `center_minute` (`-1` for every trip, in bucket order).
///
/// # Errors
///
/// Returns [`TrafficError::InvalidArgument`] if `center_minute` is outside
/// `[-1, 1439]` or `half_width` is out of range. Nothing is read in that case.
pub fn select(
    index: &TripIndex,
    kind: BucketKind,
    center_minute: i32,
    half_width: u16,
) -> Result<Vec<&TripEvent>, TrafficError> {
    let filter = TimeFilter::try_from(center_minute)?;
    let window = MinuteWindow::new(filter, half_width)?;
    Ok(index.select(kind, window).collect())
}

#[cfg(test)]
mod tests {
    use bike_map_traffic_models::DEFAULT_HALF_WIDTH_MINUTES;

    use super::*;
    use crate::test_support::index_of;

    fn window(center: u16, half_width: u16) -> MinuteWindow {
        let filter = TimeFilter::Centered(MinuteOfDay::new(center).unwrap());
        MinuteWindow::new(filter, half_width).unwrap()
    }

    fn minute(value: u16) -> MinuteOfDay {
        MinuteOfDay::new(value).unwrap()
    }

    #[test]
    fn unfiltered_covers_every_minute_in_order() {
        let w = MinuteWindow::new(TimeFilter::Unfiltered, DEFAULT_HALF_WIDTH_MINUTES).unwrap();
        assert_eq!(w, MinuteWindow::All);
        let minutes: Vec<u16> = w.minutes().map(MinuteOfDay::value).collect();
        assert_eq!(minutes, (0..1440).collect::<Vec<u16>>());
    }

    #[test]
    fn midday_window_does_not_wrap() {
        let w = window(720, 60);
        assert_eq!(w, MinuteWindow::Contiguous { low: 660, high: 780 });
        assert!(w.contains(minute(660)));
        assert!(w.contains(minute(779)));
        assert!(!w.contains(minute(780)));
        assert!(!w.contains(minute(659)));
    }

    #[test]
    fn midnight_window_wraps() {
        let w = window(0, 60);
        assert_eq!(w, MinuteWindow::Wrapped { low: 1380, high: 60 });
        assert!(w.contains(minute(1380)));
        assert!(w.contains(minute(30)));
        assert!(!w.contains(minute(700)));
        assert!(!w.contains(minute(60)));
        assert!(!w.contains(minute(1379)));
    }

    #[test]
    fn wrap_selects_late_and_early_trips() {
        let index = index_of(&[
            ("1", "2", "23:00", "23:10"),
            ("1", "2", "00:30", "00:40"),
            ("1", "2", "11:40", "11:50"),
        ]);
        let selected = select(&index, BucketKind::Departures, 0, 60).unwrap();
        let starts: Vec<u16> = selected.iter().map(|t| t.start_minute().value()).collect();
        assert_eq!(starts, vec![1380, 30]);
    }

    #[test]
    fn boundary_centers_have_no_gap_or_overlap() {
        // center == half_width: low lands exactly on 0, no wrap
        let at_start = window(60, 60);
        assert_eq!(at_start, MinuteWindow::Contiguous { low: 0, high: 120 });
        assert_eq!(at_start.len(), 120);

        // center == 1440 - half_width: high lands exactly on 0, wraps with
        // an empty tail
        let at_end = window(1380, 60);
        assert_eq!(at_end, MinuteWindow::Wrapped { low: 1320, high: 0 });
        assert_eq!(at_end.len(), 120);
        assert!(at_end.contains(minute(1439)));
        assert!(!at_end.contains(minute(0)));

        // one minute either side of each boundary
        for center in [59, 61, 1379, 1381] {
            assert_eq!(window(center, 60).len(), 120, "center {center}");
        }
    }

    #[test]
    fn every_center_covers_each_minute_once() {
        for half_width in [1, 15, 60, 300, 719, 720, 900, 1440] {
            let expected = usize::min(1440, 2 * usize::from(half_width));
            for center in 0..1440 {
                let w = window(center, half_width);
                let mut seen = [0u8; 1440];
                for m in w.minutes() {
                    seen[m.index()] += 1;
                }
                assert!(seen.iter().all(|&n| n <= 1), "duplicate at {center}/{half_width}");
                assert_eq!(w.len(), expected, "center {center}/{half_width}");
                assert_eq!(
                    seen.iter().filter(|&&n| n == 1).count(),
                    expected,
                    "center {center}/{half_width}"
                );
            }
        }
    }

    #[test]
    fn window_is_centered() {
        for center in [0, 37, 720, 1400, 1439] {
            let w = window(center, 60);
            let c = i32::from(center);
            for offset in -60..60 {
                let m = u16::try_from((c + offset).rem_euclid(1440)).unwrap();
                assert!(w.contains(minute(m)), "{center} should contain {m}");
            }
            let past = u16::try_from((c + 60).rem_euclid(1440)).unwrap();
            assert!(!w.contains(minute(past)));
        }
    }

    #[test]
    fn zero_half_width_is_empty() {
        let w = window(500, 0);
        assert!(w.is_empty());
        assert_eq!(w.minutes().count(), 0);
    }

    #[test]
    fn rejects_out_of_range_arguments() {
        let index = index_of(&[("1", "2", "08:00", "08:10")]);
        assert!(matches!(
            select(&index, BucketKind::Departures, 1440, 60),
            Err(TrafficError::InvalidArgument { .. })
        ));
        assert!(matches!(
            select(&index, BucketKind::Departures, -2, 60),
            Err(TrafficError::InvalidArgument { .. })
        ));
        assert!(matches!(
            MinuteWindow::new(TimeFilter::Unfiltered, 1441),
            Err(TrafficError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn unfiltered_select_is_bucket_concatenation() {
        let index = index_of(&[
            ("1", "2", "12:00", "12:10"),
            ("2", "1", "00:01", "00:20"),
            ("1", "1", "12:00", "13:00"),
        ]);
        let selected = select(&index, BucketKind::Departures, -1, 60).unwrap();
        let expected: Vec<&TripEvent> = index
            .departures()
            .iter()
            .flatten()
            .map(|&i| &index.trips()[i])
            .collect();
        assert_eq!(selected, expected);
        assert_eq!(selected.len(), index.len());
        assert_eq!(selected[0].start_minute().value(), 1);
    }
}
