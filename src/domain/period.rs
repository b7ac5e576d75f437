//! Month-granularity calendar value
//!
//! A [`Period`] is written as `MM-YYYY` everywhere it crosses a boundary
//! (JSON bodies, query strings, logs). Internally it orders by year, then month.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Returned when text is not a valid `MM-YYYY` period.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid period {input:?}: {reason}, expected MM-YYYY")]
pub struct PeriodFormatError {
    input: String,
    reason: &'static str,
}

impl PeriodFormatError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }

    pub fn reason(&self) -> &'static str {
        self.reason
    }
}

/// A calendar month of a specific year.
///
/// Field order matters: the derived `Ord` compares `year` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn new(month: u32, year: i32) -> Result<Self, PeriodFormatError> {
        if !(1..=12).contains(&month) {
            return Err(PeriodFormatError::new(
                &format!("{:02}-{:04}", month, year),
                "month must be between 01 and 12",
            ));
        }
        if !(0..=9999).contains(&year) {
            return Err(PeriodFormatError::new(
                &format!("{:02}-{}", month, year),
                "year must have four digits",
            ));
        }
        Ok(Self { year, month })
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// First day of the month, the representation used by the database.
    pub fn first_day(&self) -> NaiveDate {
        // Both components were range-checked at construction.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    /// Truncates a date to its month.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl FromStr for Period {
    type Err = PeriodFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 7 || bytes[2] != b'-' {
            return Err(PeriodFormatError::new(s, "wrong length or separator"));
        }

        let (month, year) = (&s[..2], &s[3..]);
        if !month.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PeriodFormatError::new(s, "month is not a number"));
        }
        if !year.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PeriodFormatError::new(s, "year is not a number"));
        }

        let month: u32 = month
            .parse()
            .map_err(|_| PeriodFormatError::new(s, "month is not a number"))?;
        let year: i32 = year
            .parse()
            .map_err(|_| PeriodFormatError::new(s, "year is not a number"))?;

        if !(1..=12).contains(&month) {
            return Err(PeriodFormatError::new(s, "month must be between 01 and 12"));
        }

        Ok(Self { year, month })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:04}", self.month, self.year)
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl From<NaiveDate> for Period {
    fn from(date: NaiveDate) -> Self {
        Self::from_date(date)
    }
}

impl From<Period> for NaiveDate {
    fn from(period: Period) -> Self {
        period.first_day()
    }
}
