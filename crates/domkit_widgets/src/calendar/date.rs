//! Calendar dates
//!
//! A thin wrapper over [`chrono::NaiveDate`] with the conversions the widget
//! needs: day timestamps for cells, ISO text for hosts, and month clamping
//! for navigation. Day timestamps are milliseconds since 1970-01-01T00:00Z of
//! the start of that day.

use std::fmt;

use chrono::{Datelike, Local, NaiveDate};

pub use chrono::Weekday;

const MS_PER_DAY: i64 = 86_400_000;

/// `num_days_from_ce` of 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;

/// A calendar date (month and day are 1-based)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    /// Create a date, validating month and day
    pub fn new(year: i32, month: u8, day: u8) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month as u32, day as u32).map(Self)
    }

    /// Today's date in the local time zone
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    pub fn naive(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Month, 1-12
    pub fn month(&self) -> u8 {
        self.0.month() as u8
    }

    /// Month, 0-11
    pub fn month0(&self) -> u8 {
        self.0.month0() as u8
    }

    pub fn day(&self) -> u8 {
        self.0.day() as u8
    }

    /// Days since 1970-01-01
    pub fn days_since_epoch(&self) -> i64 {
        self.0.num_days_from_ce() as i64 - UNIX_EPOCH_DAYS_FROM_CE
    }

    pub fn from_days_since_epoch(days: i64) -> Option<Self> {
        let days = i32::try_from(days + UNIX_EPOCH_DAYS_FROM_CE).ok()?;
        NaiveDate::from_num_days_from_ce_opt(days).map(Self)
    }

    /// Start of the day, in milliseconds since the Unix epoch
    pub fn timestamp_ms(&self) -> i64 {
        self.days_since_epoch() * MS_PER_DAY
    }

    /// The date containing the given instant
    pub fn from_timestamp_ms(millis: i64) -> Option<Self> {
        Self::from_days_since_epoch(millis.div_euclid(MS_PER_DAY))
    }

    pub fn weekday(&self) -> Weekday {
        self.0.weekday()
    }

    /// Same day in another month, clamped to that month's length
    pub fn with_year_month(self, year: i32, month: u8) -> Option<Self> {
        if !(1..=12).contains(&month) {
            return None;
        }
        let day = self.day().min(days_in_month(year, month));
        Self::new(year, month, day)
    }

    /// First day of this date's month
    pub fn first_of_month(self) -> Self {
        Self(self.0.with_day(1).unwrap_or(self.0))
    }

    /// Parse `YYYY-MM-DD`
    pub fn parse_iso(input: &str) -> Option<Self> {
        NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
            .ok()
            .map(Self)
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Source of the real current date
pub trait Clock {
    fn today(&self) -> CalendarDate;
}

/// Clock backed by the local system time
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> CalendarDate {
        CalendarDate::today()
    }
}

/// Clock frozen at one date
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub CalendarDate);

impl Clock for FixedClock {
    fn today(&self) -> CalendarDate {
        self.0
    }
}

/// Grid column of `weekday` in a week starting on `first`
pub fn column_of(weekday: Weekday, first: Weekday) -> u8 {
    ((weekday.num_days_from_sunday() + 7 - first.num_days_from_sunday()) % 7) as u8
}

pub fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

/// Number of days in a month (1-12)
pub fn days_in_month(year: i32, month: u8) -> u8 {
    let (next_year, next_month) = if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month as u32 + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map_or(30, |d| d.day() as u8)
}

/// The month before `month` (1-12), with its year
pub fn previous_month(year: i32, month: u8) -> (i32, u8) {
    if month <= 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}
