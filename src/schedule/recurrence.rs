//! Recurrence rules and their expansion into concrete occurrences.
//!
//! A [`RecurrenceRule`] belongs to one recurring personal-event
//! definition and is immutable; [`RecurrenceRule::expand`] is a pure
//! function producing every occurrence that overlaps a query window, in
//! chronological order. Expansion is recomputed on every call — there
//! is no incremental state to invalidate.
//!
//! `AfterCount` rules are counted from the rule's first occurrence, not
//! from the window: a rule that ends after 3 occurrences yields nothing
//! in a window that only spans where occurrences 4–6 would have been.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::interval::TimeInterval;

/// Hard bound on expansion loop iterations. A rule that cannot finish
/// within this many steps is a data error, not a reason to hang; the
/// expansion is truncated and flagged.
pub const MAX_EXPANSION_STEPS: usize = 10_000;

/// How often a recurring event repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    /// Delegates to [`CustomFrequency`] stepping, with `by_day` applied
    /// when the custom type is weekly.
    Custom,
}

/// Secondary frequency for [`Frequency::Custom`] rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CustomFrequency {
    Weekly,
    Monthly,
    Yearly,
}

/// When a recurrence stops producing occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EndCondition {
    /// No end; only the query window bounds expansion.
    #[default]
    Never,
    /// Stop once an occurrence start falls after this civil date.
    OnDate(NaiveDate),
    /// Stop after this many occurrences from the rule's first
    /// occurrence, counted globally rather than per query window.
    AfterCount(u32),
}

/// Recurrence configuration for a repeating personal event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RecurrenceRule {
    /// The recurrence frequency.
    pub frequency: Frequency,
    /// Step between occurrences in units of the frequency (>= 1).
    #[serde(default = "default_interval")]
    pub interval: u32,
    /// Weekdays to emit within each week bucket, for weekly rules.
    #[serde(default)]
    pub by_day: Vec<Weekday>,
    /// Day of month for monthly rules (overrides the first
    /// occurrence's day).
    #[serde(default)]
    pub by_month_day: Vec<u32>,
    /// Months (1..=12) a monthly rule is restricted to.
    #[serde(default)]
    pub by_month: Vec<u32>,
    /// End condition.
    #[serde(default)]
    pub end: EndCondition,
    /// Secondary frequency for `Custom` rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_frequency: Option<CustomFrequency>,
}

fn default_interval() -> u32 {
    1
}

impl RecurrenceRule {
    fn with_frequency(frequency: Frequency) -> Self {
        Self {
            frequency,
            interval: 1,
            by_day: Vec::new(),
            by_month_day: Vec::new(),
            by_month: Vec::new(),
            end: EndCondition::Never,
            custom_frequency: None,
        }
    }

    /// Create a daily recurrence.
    pub fn daily() -> Self {
        Self::with_frequency(Frequency::Daily)
    }

    /// Create a weekly recurrence.
    pub fn weekly() -> Self {
        Self::with_frequency(Frequency::Weekly)
    }

    /// Create a weekly recurrence on specific weekdays.
    pub fn weekly_on(days: impl IntoIterator<Item = Weekday>) -> Self {
        Self {
            by_day: days.into_iter().collect(),
            ..Self::with_frequency(Frequency::Weekly)
        }
    }

    /// Create a monthly recurrence.
    pub fn monthly() -> Self {
        Self::with_frequency(Frequency::Monthly)
    }

    /// Create a monthly recurrence on a specific day of the month.
    pub fn monthly_on(day: u32) -> Self {
        Self {
            by_month_day: vec![day],
            ..Self::with_frequency(Frequency::Monthly)
        }
    }

    /// Create a yearly recurrence.
    pub fn yearly() -> Self {
        Self::with_frequency(Frequency::Yearly)
    }

    /// Create a custom recurrence delegating to a secondary frequency.
    pub fn custom(custom_frequency: CustomFrequency) -> Self {
        Self {
            custom_frequency: Some(custom_frequency),
            ..Self::with_frequency(Frequency::Custom)
        }
    }

    /// Set the interval (clamped to at least 1).
    pub fn every(mut self, interval: u32) -> Self {
        self.interval = interval.max(1);
        self
    }

    /// End the recurrence on a date.
    pub fn until(mut self, date: NaiveDate) -> Self {
        self.end = EndCondition::OnDate(date);
        self
    }

    /// End the recurrence after a number of occurrences.
    pub fn times(mut self, count: u32) -> Self {
        self.end = EndCondition::AfterCount(count);
        self
    }

    /// Restrict a monthly recurrence to specific months (1..=12).
    pub fn in_months(mut self, months: impl IntoIterator<Item = u32>) -> Self {
        self.by_month = months.into_iter().collect();
        self
    }

    /// Expand the rule over a query window.
    ///
    /// `first` is the rule's first occurrence; every produced occurrence
    /// preserves its time-of-day and duration. Occurrences are emitted
    /// in chronological order and clipped to those overlapping
    /// `window`. Expansion stops at the end condition, at the window
    /// bound, or at `max_steps` iterations — whichever comes first.
    pub fn expand(
        &self,
        first: TimeInterval,
        window: TimeInterval,
        max_steps: usize,
    ) -> Expansion {
        let mut occurrences = Vec::new();
        let mut truncated = false;

        if !first.is_well_formed() || !window.is_well_formed() {
            return Expansion {
                occurrences,
                truncated,
            };
        }

        let stepper = self.stepper(first.start);
        let duration = first.duration();
        let mut emitted: u32 = 0;
        let mut k: usize = 0;

        loop {
            if k >= max_steps {
                truncated = true;
                break;
            }
            let candidate = stepper.candidate(first.start, k);
            k += 1;

            let Some(start) = candidate else {
                // No occurrence exists at this position (e.g. Feb 30, or
                // a month outside by_month); it does not count.
                continue;
            };
            if start < first.start {
                // Weekday slots earlier in the first week than the rule's
                // actual start are not occurrences.
                continue;
            }
            match self.end {
                EndCondition::OnDate(date) if start.date_naive() > date => break,
                EndCondition::AfterCount(n) if emitted >= n => break,
                _ => {}
            }
            if start > window.end {
                break;
            }
            emitted = emitted.saturating_add(1);

            let occurrence = TimeInterval::new(start, start + duration);
            if occurrence.overlaps(&window) {
                occurrences.push(occurrence);
            }
        }

        Expansion {
            occurrences,
            truncated,
        }
    }

    fn stepper(&self, first_start: DateTime<Utc>) -> Stepper {
        let interval = i64::from(self.interval.max(1));
        let effective = match self.frequency {
            Frequency::Custom => match self.custom_frequency.unwrap_or(CustomFrequency::Weekly) {
                CustomFrequency::Weekly => Frequency::Weekly,
                CustomFrequency::Monthly => Frequency::Monthly,
                CustomFrequency::Yearly => Frequency::Yearly,
            },
            other => other,
        };

        match effective {
            Frequency::Daily => Stepper::Days(interval),
            Frequency::Weekly if !self.by_day.is_empty() => {
                let mut days: Vec<Weekday> = self.by_day.clone();
                days.sort_by_key(|d| d.num_days_from_monday());
                days.dedup();
                // Anchor at the Monday of the first occurrence's week so
                // bucket boundaries are stable across query windows.
                let back = i64::from(first_start.weekday().num_days_from_monday());
                Stepper::WeeklyByDay {
                    anchor: first_start - Duration::days(back),
                    days,
                    interval,
                }
            }
            Frequency::Weekly => Stepper::Weeks(interval),
            Frequency::Monthly => Stepper::Months {
                interval,
                day: self.by_month_day.first().copied(),
                months: self.by_month.clone(),
            },
            Frequency::Yearly => Stepper::Years(interval),
            Frequency::Custom => unreachable!("custom frequency resolved above"),
        }
    }
}

/// Result of expanding a recurrence rule over a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    /// Occurrences overlapping the window, chronological.
    pub occurrences: Vec<TimeInterval>,
    /// True when the iteration cap was hit before the rule finished;
    /// the occurrence list may be incomplete.
    pub truncated: bool,
}

/// Candidate-start generator for one rule. Candidate `k` is the `k`-th
/// position in the rule's timeline; positions with no valid date yield
/// `None` and are skipped without counting as occurrences.
enum Stepper {
    Days(i64),
    Weeks(i64),
    WeeklyByDay {
        anchor: DateTime<Utc>,
        days: Vec<Weekday>,
        interval: i64,
    },
    Months {
        interval: i64,
        day: Option<u32>,
        months: Vec<u32>,
    },
    Years(i64),
}

impl Stepper {
    fn candidate(&self, first_start: DateTime<Utc>, k: usize) -> Option<DateTime<Utc>> {
        match self {
            Stepper::Days(step) => Some(first_start + Duration::days(step * k as i64)),
            Stepper::Weeks(step) => Some(first_start + Duration::weeks(step * k as i64)),
            Stepper::WeeklyByDay {
                anchor,
                days,
                interval,
            } => {
                let bucket = (k / days.len()) as i64;
                let weekday = days[k % days.len()];
                let offset = Duration::weeks(bucket * interval)
                    + Duration::days(i64::from(weekday.num_days_from_monday()));
                Some(*anchor + offset)
            }
            Stepper::Months {
                interval,
                day,
                months,
            } => {
                let total = i64::from(first_start.month0()) + interval * k as i64;
                let year = first_start.year() + (total / 12) as i32;
                let month = (total % 12) as u32 + 1;
                if !months.is_empty() && !months.contains(&month) {
                    return None;
                }
                let day = day.unwrap_or_else(|| first_start.day());
                // Months lacking this day are skipped, not rolled over.
                let date = NaiveDate::from_ymd_opt(year, month, day)?;
                Some(Utc.from_utc_datetime(&date.and_time(first_start.time())))
            }
            Stepper::Years(step) => {
                let year = first_start.year() + (step * k as i64) as i32;
                let date = NaiveDate::from_ymd_opt(year, first_start.month(), first_start.day())?;
                Some(Utc.from_utc_datetime(&date.and_time(first_start.time())))
            }
        }
    }
}
