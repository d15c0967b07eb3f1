//! Simulated wall clock.
//!
//! Delay costs are opaque integers in a scenario's [`TimeUnit`]. The clock
//! maps an accumulated cost onto a calendar time measured from the
//! scenario's start, so the view can show "Completed at 01:00 PM" without
//! the core ever reading real time.

use crate::types::TimeUnit;
use chrono::{Duration, NaiveDate, NaiveDateTime};

pub const FULL_FORMAT: &str = "%d-%b-%Y %I:%M %p";
pub const TIME_FORMAT: &str = "%I:%M %p";

/// Default clock origin: 1 Aug 2025, 09:00.
pub fn default_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 8, 1)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimClock {
    start: NaiveDateTime,
    unit: TimeUnit,
}

impl SimClock {
    pub fn new(start: NaiveDateTime, unit: TimeUnit) -> Self {
        Self { start, unit }
    }

    /// Simulated time after `elapsed` units. Saturates at the chrono range.
    pub fn at(&self, elapsed: u64) -> NaiveDateTime {
        let secs = i64::try_from(elapsed)
            .ok()
            .and_then(|e| e.checked_mul(self.unit.seconds_per_unit()))
            .unwrap_or(i64::MAX);
        Duration::try_seconds(secs)
            .and_then(|d| self.start.checked_add_signed(d))
            .unwrap_or(NaiveDateTime::MAX)
    }
}

pub fn format_full(t: NaiveDateTime) -> String {
    t.format(FULL_FORMAT).to_string()
}

pub fn format_time(t: NaiveDateTime) -> String {
    t.format(TIME_FORMAT).to_string()
}
