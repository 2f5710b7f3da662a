//! Time intervals and the overlap primitive.
//!
//! Everything in conflict detection bottoms out in one question: do two
//! half-open intervals overlap. Intervals are half-open `[start, end)`,
//! so a rehearsal ending exactly when another begins is not a conflict.
//!
//! Agenda items and production events arrive as a civil date plus a
//! time-of-day; [`combine_civil`] interprets that pair as wall-clock
//! time in the production's venue zone rather than reparsing it through
//! the server's local zone, which is how one-day shifts creep in.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A half-open time interval `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TimeInterval {
    /// Start of the interval (inclusive).
    pub start: DateTime<Utc>,
    /// End of the interval (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeInterval {
    /// Create a new interval. No validation is performed; malformed
    /// intervals (`end < start`) are inert rather than rejected — they
    /// overlap nothing and never panic.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Whether the interval is well-formed (`start <= end`).
    pub fn is_well_formed(&self) -> bool {
        self.start <= self.end
    }

    /// Whether the interval has zero duration.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Duration of the interval. Zero for malformed intervals.
    pub fn duration(&self) -> Duration {
        if self.is_well_formed() {
            self.end - self.start
        } else {
            Duration::zero()
        }
    }

    /// Strict half-open overlap test.
    ///
    /// Touching endpoints (`self.end == other.start`) do NOT overlap:
    /// back-to-back scheduling is allowed. Symmetric. Malformed or
    /// zero-length intervals on either side overlap nothing.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        if !self.is_well_formed() || !other.is_well_formed() {
            return false;
        }
        self.start < other.end && other.start < self.end
    }

    /// The overlapping portion of two intervals, if any.
    pub fn intersection(&self, other: &TimeInterval) -> Option<TimeInterval> {
        if !self.overlaps(other) {
            return None;
        }
        Some(TimeInterval::new(
            self.start.max(other.start),
            self.end.min(other.end),
        ))
    }

    /// Shift the whole interval by a duration, preserving its length.
    pub fn shifted(&self, by: Duration) -> TimeInterval {
        TimeInterval::new(self.start + by, self.end + by)
    }

    /// Extend the interval to at least `min` long. Used to give
    /// zero-length records a footprint when the deployment opts in via
    /// `min_event_duration_minutes`; malformed intervals stay inert.
    pub fn with_min_duration(&self, min: Duration) -> TimeInterval {
        if self.is_well_formed() && self.duration() < min {
            TimeInterval::new(self.start, self.start + min)
        } else {
            *self
        }
    }
}

/// Combine a civil date and time-of-day into an instant, interpreting
/// the pair as wall-clock time in `zone`.
///
/// Ambiguous local times (DST fall-back) resolve to the earlier
/// instant; skipped local times (spring-forward gap) resolve to the end
/// of the gap. Returns `None` only for dates chrono cannot represent.
pub fn combine_civil(date: NaiveDate, time: NaiveTime, zone: Tz) -> Option<DateTime<Utc>> {
    let naive = date.and_time(time);
    match zone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earlier, _) => Some(earlier.with_timezone(&Utc)),
        LocalResult::None => {
            // Inside a spring-forward gap; walk forward to the first
            // representable local time, i.e. the end of the gap.
            (1..=48 * 60).find_map(|minutes| {
                let bumped = naive + Duration::minutes(minutes);
                zone.from_local_datetime(&bumped)
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc))
            })
        }
    }
}

/// Combine a civil date with start and end times-of-day into an
/// interval in the venue zone. An end at or before the start on the
/// same date yields a malformed interval, which overlaps nothing.
pub fn civil_interval(
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    zone: Tz,
) -> Option<TimeInterval> {
    let start = combine_civil(date, start, zone)?;
    let end = combine_civil(date, end, zone)?;
    Some(TimeInterval::new(start, end))
}

/// The full calendar day `[00:00, next-day 00:00)` in the venue zone,
/// for normalizing all-day events.
pub fn all_day(date: NaiveDate, zone: Tz) -> Option<TimeInterval> {
    let midnight = NaiveTime::from_hms_opt(0, 0, 0)?;
    let start = combine_civil(date, midnight, zone)?;
    let end = combine_civil(date.succ_opt()?, midnight, zone)?;
    Some(TimeInterval::new(start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;
    use chrono_tz::UTC;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_overlap_symmetry() {
        let a = TimeInterval::new(utc(2024, 3, 5, 10, 0), utc(2024, 3, 5, 12, 0));
        let b = TimeInterval::new(utc(2024, 3, 5, 11, 0), utc(2024, 3, 5, 13, 0));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn test_touching_is_not_overlapping() {
        let a = TimeInterval::new(utc(2024, 3, 5, 10, 0), utc(2024, 3, 5, 11, 0));
        let b = TimeInterval::new(utc(2024, 3, 5, 11, 0), utc(2024, 3, 5, 12, 0));
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn test_strict_containment_overlaps() {
        let outer = TimeInterval::new(utc(2024, 3, 5, 10, 0), utc(2024, 3, 5, 12, 0));
        let inner = TimeInterval::new(utc(2024, 3, 5, 10, 30), utc(2024, 3, 5, 11, 0));
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn test_malformed_interval_overlaps_nothing() {
        let malformed = TimeInterval::new(utc(2024, 3, 5, 12, 0), utc(2024, 3, 5, 10, 0));
        let normal = TimeInterval::new(utc(2024, 3, 5, 9, 0), utc(2024, 3, 5, 13, 0));
        assert!(!malformed.is_well_formed());
        assert!(!malformed.overlaps(&normal));
        assert!(!normal.overlaps(&malformed));
    }

    #[test]
    fn test_zero_length_overlaps_nothing() {
        let point = TimeInterval::new(utc(2024, 3, 5, 11, 0), utc(2024, 3, 5, 11, 0));
        let around = TimeInterval::new(utc(2024, 3, 5, 10, 0), utc(2024, 3, 5, 12, 0));
        assert!(!point.overlaps(&around));
        assert!(!around.overlaps(&point));
    }

    #[test]
    fn test_min_duration_normalization() {
        let point = TimeInterval::new(utc(2024, 3, 5, 11, 0), utc(2024, 3, 5, 11, 0));
        let widened = point.with_min_duration(Duration::minutes(15));
        let around = TimeInterval::new(utc(2024, 3, 5, 10, 0), utc(2024, 3, 5, 12, 0));
        assert!(widened.overlaps(&around));
        assert_eq!(widened.duration(), Duration::minutes(15));

        // Malformed intervals stay inert.
        let malformed = TimeInterval::new(utc(2024, 3, 5, 12, 0), utc(2024, 3, 5, 10, 0));
        assert_eq!(malformed.with_min_duration(Duration::minutes(15)), malformed);
    }

    #[test]
    fn test_intersection() {
        let a = TimeInterval::new(utc(2024, 3, 5, 10, 0), utc(2024, 3, 5, 12, 0));
        let b = TimeInterval::new(utc(2024, 3, 5, 11, 0), utc(2024, 3, 5, 13, 0));
        let overlap = a.intersection(&b).unwrap();
        assert_eq!(overlap.start, utc(2024, 3, 5, 11, 0));
        assert_eq!(overlap.end, utc(2024, 3, 5, 12, 0));

        let c = TimeInterval::new(utc(2024, 3, 5, 13, 0), utc(2024, 3, 5, 14, 0));
        assert!(a.intersection(&c).is_none());
    }

    #[test]
    fn test_combine_civil_in_venue_zone() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let time = NaiveTime::from_hms_opt(13, 30, 0).unwrap();

        // 13:30 in New York is 18:30 UTC in March (EST, -05:00).
        let instant = combine_civil(date, time, New_York).unwrap();
        assert_eq!(instant, utc(2024, 3, 5, 18, 30));

        let instant = combine_civil(date, time, UTC).unwrap();
        assert_eq!(instant, utc(2024, 3, 5, 13, 30));
    }

    #[test]
    fn test_combine_civil_spring_forward_gap_resolves_to_gap_end() {
        // 2024-03-10 02:30 does not exist in New York; clocks jump
        // from 02:00 EST straight to 03:00 EDT. Every skipped local
        // time resolves to the gap end, 03:00 EDT = 07:00 UTC.
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let time = NaiveTime::from_hms_opt(2, 30, 0).unwrap();
        let instant = combine_civil(date, time, New_York).unwrap();
        assert_eq!(instant, utc(2024, 3, 10, 7, 0));

        let gap_start = NaiveTime::from_hms_opt(2, 0, 0).unwrap();
        let instant = combine_civil(date, gap_start, New_York).unwrap();
        assert_eq!(instant, utc(2024, 3, 10, 7, 0));
    }

    #[test]
    fn test_all_day_spans_full_venue_day() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let day = all_day(date, UTC).unwrap();
        assert_eq!(day.start, utc(2024, 3, 5, 0, 0));
        assert_eq!(day.end, utc(2024, 3, 6, 0, 0));
        assert_eq!(day.duration(), Duration::hours(24));
    }
}
