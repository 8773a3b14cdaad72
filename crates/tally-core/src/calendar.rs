//! # Business Calendar
//!
//! Month windows and "today" for every engine.
//!
//! ## Why a Fixed Offset?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  A sale recorded at 2024-06-30T17:30:00Z                                │
//! │                                                                         │
//! │    in UTC     → June  (salary for June)                                 │
//! │    in UTC+8   → July  (salary for July)   ← what the shop sees          │
//! │                                                                         │
//! │  Months, month ends and remaining gift days are all evaluated in ONE    │
//! │  configured offset (default UTC+8), never in the host's local zone.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Timestamps are stored in UTC. The calendar converts them into the
//! business offset only to decide which month they belong to.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::ValidationError;

/// Offset used when nothing else is configured (UTC+8).
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 8;

// =============================================================================
// Year / Month
// =============================================================================

/// A calendar month. Always valid: `month` is 1-12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(try_from = "RawYearMonth")]
#[ts(export)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

#[derive(Deserialize)]
struct RawYearMonth {
    year: i32,
    month: u32,
}

impl TryFrom<RawYearMonth> for YearMonth {
    type Error = ValidationError;

    fn try_from(raw: RawYearMonth) -> Result<Self, Self::Error> {
        YearMonth::new(raw.year, raw.month)
    }
}

impl YearMonth {
    /// Creates a month, rejecting anything outside 1-12 or a year chrono
    /// cannot represent.
    pub fn new(year: i32, month: u32) -> Result<Self, ValidationError> {
        if !(1..=12).contains(&month) {
            return Err(ValidationError::OutOfRange {
                field: "month".to_string(),
                min: 1,
                max: 12,
            });
        }
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(ValidationError::OutOfRange {
                field: "year".to_string(),
                min: NaiveDate::MIN.year() as i64,
                max: NaiveDate::MAX.year() as i64,
            });
        }
        Ok(YearMonth { year, month })
    }

    #[inline]
    pub const fn year(&self) -> i32 {
        self.year
    }

    #[inline]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// The following month (December rolls into January).
    pub fn next(&self) -> YearMonth {
        if self.month == 12 {
            YearMonth { year: self.year + 1, month: 1 }
        } else {
            YearMonth { year: self.year, month: self.month + 1 }
        }
    }

    /// The preceding month (January rolls back into December).
    pub fn prev(&self) -> YearMonth {
        if self.month == 1 {
            YearMonth { year: self.year - 1, month: 12 }
        } else {
            YearMonth { year: self.year, month: self.month - 1 }
        }
    }

    /// First day of the month as a naive date.
    fn first_day(&self) -> NaiveDate {
        // `new` already proved this date exists
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

// =============================================================================
// Business Calendar
// =============================================================================

/// Converts between UTC timestamps and business months.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessCalendar {
    offset: FixedOffset,
}

impl BusinessCalendar {
    pub fn new(offset: FixedOffset) -> Self {
        BusinessCalendar { offset }
    }

    /// Builds a calendar from a whole-hour offset such as `8` or `-5`.
    pub fn from_utc_offset_hours(hours: i32) -> Result<Self, ValidationError> {
        FixedOffset::east_opt(hours * 3600)
            .filter(|_| (-12..=14).contains(&hours))
            .map(BusinessCalendar::new)
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "utc_offset_hours".to_string(),
                min: -12,
                max: 14,
            })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The business month a timestamp falls into.
    pub fn month_of(&self, ts: DateTime<Utc>) -> YearMonth {
        let local = ts.with_timezone(&self.offset);
        YearMonth {
            year: local.year(),
            month: local.month(),
        }
    }

    /// Alias of [`month_of`](Self::month_of) that reads better at call sites
    /// that pass "now".
    pub fn current_month(&self, now: DateTime<Utc>) -> YearMonth {
        self.month_of(now)
    }

    /// Local midnight on the first of the month, in UTC.
    pub fn month_start(&self, ym: YearMonth) -> DateTime<Utc> {
        let local_midnight = ym.first_day().and_time(NaiveTime::MIN);
        local_midnight.and_utc() - Duration::seconds(self.offset.local_minus_utc() as i64)
    }

    /// The last millisecond of the month, in UTC.
    pub fn month_end(&self, ym: YearMonth) -> DateTime<Utc> {
        self.month_start(ym.next()) - Duration::milliseconds(1)
    }

    /// Whether `ts` falls in `[month_start, month_end]`.
    pub fn contains(&self, ym: YearMonth, ts: DateTime<Utc>) -> bool {
        self.month_of(ts) == ym
    }
}

impl Default for BusinessCalendar {
    fn default() -> Self {
        let offset = FixedOffset::east_opt(DEFAULT_UTC_OFFSET_HOURS * 3600).unwrap_or_else(|| Utc.fix());
        BusinessCalendar::new(offset)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
