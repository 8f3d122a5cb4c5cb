use std::fmt;

use chrono::{Datelike, Local, NaiveDate};

use crate::error::DateError;

/// Stored in place of a test date for users who have never been tested.
pub const SENTINEL: &str = "00/00/0000";

const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 2100;

/// A validated Gregorian date between 1900 and 2100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    pub fn new(day: u32, month: u32, year: i32) -> Result<Self, DateError> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(DateError::YearOutOfRange(year));
        }
        if !(1..=12).contains(&month) {
            return Err(DateError::MonthOutOfRange(month));
        }
        if !(1..=31).contains(&day) {
            return Err(DateError::DayOutOfRange(day));
        }
        if day > days_in_month(month, year) {
            return Err(DateError::DayOverflow { day, month, year });
        }

        NaiveDate::from_ymd_opt(year, month, day)
            .map(CalendarDate)
            .ok_or(DateError::DayOverflow { day, month, year })
    }

    /// The local calendar date. Sample once per invocation and pass it down.
    pub fn today() -> Self {
        CalendarDate(Local::now().date_naive())
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }
}

#[cfg(test)]
impl CalendarDate {
    pub fn days_ago(&self, days: i64) -> Option<Self> {
        self.0
            .checked_sub_signed(chrono::Duration::days(days))
            .map(CalendarDate)
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}/{:04}", self.day(), self.month(), self.year())
    }
}

/// Parses `DD/MM/YYYY`, also accepting single-digit day and month.
pub fn parse_date(text: &str) -> Result<CalendarDate, DateError> {
    let trimmed = text.trim();
    let parts: Vec<&str> = trimmed.split('/').collect();
    let [day, month, year] = parts.as_slice() else {
        return Err(DateError::InvalidFormat(trimmed.to_string()));
    };

    let day = parse_component(day, 1..=2, trimmed)?;
    let month = parse_component(month, 1..=2, trimmed)?;
    let year = parse_component(year, 4..=4, trimmed)?;

    CalendarDate::new(day, month, year as i32)
}

fn parse_component(
    field: &str,
    width: std::ops::RangeInclusive<usize>,
    whole: &str,
) -> Result<u32, DateError> {
    if !field.chars().all(|c| c.is_ascii_digit()) {
        return Err(DateError::NonNumeric(field.to_string()));
    }
    if !width.contains(&field.len()) {
        return Err(DateError::InvalidFormat(whole.to_string()));
    }
    field
        .parse()
        .map_err(|_| DateError::NonNumeric(field.to_string()))
}

pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

fn days_in_month(month: u32, year: i32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

pub fn is_sentinel(text: &str) -> bool {
    text.trim() == SENTINEL
}

/// Signed calendar-day difference, `today - earlier`.
pub fn days_between(today: CalendarDate, earlier: CalendarDate) -> i64 {
    (today.0 - earlier.0).num_days()
}

/// When the user last took a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestDate {
    NeverTested,
    Tested(CalendarDate),
}

impl TestDate {
    /// Reads the on-disk form, where the sentinel (or an empty field) means
    /// never tested.
    pub fn parse_stored(text: &str) -> Result<Self, DateError> {
        if text.trim().is_empty() || is_sentinel(text) {
            return Ok(TestDate::NeverTested);
        }
        parse_date(text).map(TestDate::Tested)
    }
}

impl fmt::Display for TestDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestDate::NeverTested => f.write_str(SENTINEL),
            TestDate::Tested(date) => date.fmt(f),
        }
    }
}
