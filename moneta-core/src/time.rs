//! Time utilities: calendar-month labels, fetch windows and ISO dates.

use std::fmt;

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DateError;

const SHORT_MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Years accepted by [`year_window`]
pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 3000;

/// A calendar month, displayed as `"Mar 2024"`.
///
/// Ordering is chronological (year first, then month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthLabel {
    year: i32,
    month: u32,
}

impl MonthLabel {
    /// `month` is 1-based; returns `None` outside 1..=12
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// January..December of `year`
    pub fn months_of_year(year: i32) -> [MonthLabel; 12] {
        std::array::from_fn(|idx| Self {
            year,
            month: idx as u32 + 1,
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// 1-based month number
    pub fn month(&self) -> u32 {
        self.month
    }

    /// 0-based month index (January = 0)
    pub fn month_index(&self) -> usize {
        self.month as usize - 1
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl fmt::Display for MonthLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:04}", SHORT_MONTHS[self.month_index()], self.year)
    }
}

impl std::str::FromStr for MonthLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (month, year) = s
            .trim()
            .split_once(' ')
            .ok_or_else(|| format!("invalid month label '{s}'"))?;
        let idx = SHORT_MONTHS
            .iter()
            .position(|m| *m == month)
            .ok_or_else(|| format!("invalid month name '{month}'"))?;
        let year: i32 = year
            .trim()
            .parse()
            .map_err(|_| format!("invalid year '{year}'"))?;
        Ok(Self {
            year,
            month: idx as u32 + 1,
        })
    }
}

impl Serialize for MonthLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Every month from `first` through `last`, inclusive. Empty if `last < first`.
pub fn month_range(first: MonthLabel, last: MonthLabel) -> Vec<MonthLabel> {
    let mut out = Vec::new();
    let mut current = first;
    while current <= last {
        out.push(current);
        current = current.next();
    }
    out
}

/// Parse a store date (`YYYY-MM-DD`) with a fixed format.
pub fn parse_iso_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
}

/// Format a date the way the store's date filters expect it.
pub fn format_api_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Inclusive on both ends
pub fn is_date_in_range(date: NaiveDate, start: NaiveDate, end: NaiveDate) -> bool {
    start <= date && date <= end
}

/// Fetch window for a whole calendar year.
///
/// The window starts `delay_days` after January 1st (so a user can skip
/// carry-over entries booked in the first days) and ends on December 31st.
pub fn year_window(year: i32, delay_days: i64) -> Result<(NaiveDate, NaiveDate), DateError> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(DateError::InvalidYear(year));
    }
    let first = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(DateError::InvalidYear(year))?;
    let last = NaiveDate::from_ymd_opt(year, 12, 31).ok_or(DateError::InvalidYear(year))?;
    let delay = Duration::try_days(delay_days).ok_or(DateError::OutOfRange)?;
    let start = first.checked_add_signed(delay).ok_or(DateError::OutOfRange)?;
    Ok((start, last))
}

/// Budget period containing `today`.
///
/// A period starts on `start_day` of a month and ends the day before the same
/// day of the following month. When `today` falls before this month's start
/// day, the previous period is returned. Start days past the end of a short
/// month are clamped to its last day.
pub fn budget_period(start_day: u32, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), DateError> {
    if !(1..=31).contains(&start_day) {
        return Err(DateError::InvalidStartDay(start_day));
    }

    let this_month = MonthLabel::from_date(today);
    let mut start = clamped_day(this_month, start_day)?;
    if today < start {
        let previous = today
            .with_day(1)
            .and_then(|d| d.checked_sub_months(Months::new(1)))
            .ok_or(DateError::OutOfRange)?;
        start = clamped_day(MonthLabel::from_date(previous), start_day)?;
    }

    let end = clamped_day(MonthLabel::from_date(start).next(), start_day)?
        .pred_opt()
        .ok_or(DateError::OutOfRange)?;
    Ok((start, end))
}

fn clamped_day(month: MonthLabel, day: u32) -> Result<NaiveDate, DateError> {
    let last = last_day_of_month(month)?;
    NaiveDate::from_ymd_opt(month.year, month.month, day.min(last)).ok_or(DateError::OutOfRange)
}

fn last_day_of_month(month: MonthLabel) -> Result<u32, DateError> {
    let next = month.next();
    NaiveDate::from_ymd_opt(next.year, next.month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .ok_or(DateError::OutOfRange)
}
