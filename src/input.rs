use crate::date::{parse_date, CalendarDate};
use crate::error::InputError;

pub const MIN_AGE: u8 = 1;
pub const MAX_AGE: u8 = 120;

/// Accepts exactly `1` (yes) or `0` (no).
pub fn parse_flag(text: &str) -> Result<bool, InputError> {
    match text.trim() {
        "1" => Ok(true),
        "0" => Ok(false),
        _ => Err(InputError::NotAFlag(text.to_string())),
    }
}

pub fn parse_age(text: &str) -> Result<u8, InputError> {
    text.trim()
        .parse::<u8>()
        .ok()
        .filter(|age| (MIN_AGE..=MAX_AGE).contains(age))
        .ok_or_else(|| InputError::Age(text.to_string()))
}

/// A test date as typed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateInput {
    Today,
    On(CalendarDate),
}

impl DateInput {
    pub fn resolve(self, today: CalendarDate) -> CalendarDate {
        match self {
            DateInput::Today => today,
            DateInput::On(date) => date,
        }
    }
}

pub fn parse_date_input(text: &str) -> Result<DateInput, InputError> {
    if text.trim().eq_ignore_ascii_case("today") {
        return Ok(DateInput::Today);
    }
    Ok(DateInput::On(parse_date(text)?))
}
