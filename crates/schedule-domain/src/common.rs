//! Shared traits, calendar utilities, and value objects for schedule primitives.

use std::{fmt, str::FromStr};

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Exposes a stable identifier for entities tracked by the schedule.
pub trait Identifiable {
    fn id(&self) -> Uuid;
}

/// Provides read-only access to an entity's display name.
pub trait NamedEntity {
    fn name(&self) -> &str;
}

/// ISO 4217 currency representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors that can occur when constructing [`DateWindow`] or [`MonthRef`] values.
pub enum WindowError {
    #[error("date window end {end} is before start {start}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
    #[error("invalid calendar month {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },
    #[error("cannot parse month `{0}`, expected YYYY-MM")]
    Unparseable(String),
}

/// Inclusive calendar interval `[start, end]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, WindowError> {
        if end < start {
            return Err(WindowError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Window covering one whole calendar month.
    pub fn month(year: i32, month: u32) -> Result<Self, WindowError> {
        Ok(MonthRef::new(year, month)?.window())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Calendar months touched by the window, in ascending order.
    pub fn months(&self) -> Vec<MonthRef> {
        let last = MonthRef::of(self.end);
        let mut cursor = MonthRef::of(self.start);
        let mut months = vec![cursor];
        while cursor < last {
            match cursor.next() {
                Some(next) => cursor = next,
                None => break,
            }
            months.push(cursor);
        }
        months
    }
}

/// A calendar month, e.g. `2025-10`.
///
/// Only months whose every day is representable as a [`NaiveDate`] can be
/// constructed, so [`MonthRef::day`] always yields a real date.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthRef {
    year: i32,
    month: u32,
}

impl MonthRef {
    pub fn new(year: i32, month: u32) -> Result<Self, WindowError> {
        let representable = (1..=12).contains(&month)
            && NaiveDate::from_ymd_opt(year, month, 1).is_some()
            && NaiveDate::from_ymd_opt(year, month, days_in_month(year, month)).is_some();
        if !representable {
            return Err(WindowError::InvalidMonth { year, month });
        }
        Ok(Self { year, month })
    }

    /// Month containing `date`. chrono's supported range starts on 1 January
    /// and ends on 31 December, so the whole month is representable.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn days(&self) -> u32 {
        days_in_month(self.year, self.month)
    }

    pub fn first_day(&self) -> NaiveDate {
        self.day(1)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.day(self.days())
    }

    /// Date for `day` in this month, clamped to the month's last day.
    pub fn day(&self, day: u32) -> NaiveDate {
        let day = day.clamp(1, self.days());
        match NaiveDate::from_ymd_opt(self.year, self.month, day) {
            Some(date) => date,
            None => unreachable!("{self} was validated on construction"),
        }
    }

    pub fn window(&self) -> DateWindow {
        DateWindow {
            start: self.first_day(),
            end: self.last_day(),
        }
    }

    /// Following month, or `None` past the end of the supported calendar.
    pub fn next(&self) -> Option<Self> {
        self.shift(1)
    }

    /// Preceding month, or `None` before the start of the supported calendar.
    pub fn previous(&self) -> Option<Self> {
        self.shift(-1)
    }

    fn shift(&self, months: i32) -> Option<Self> {
        let index = self
            .year
            .checked_mul(12)?
            .checked_add(self.month as i32 - 1 + months)?;
        Self::new(index.div_euclid(12), index.rem_euclid(12) as u32 + 1).ok()
    }
}

impl fmt::Display for MonthRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthRef {
    type Err = WindowError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let unparseable = || WindowError::Unparseable(trimmed.to_string());
        let (year, month) = trimmed.split_once('-').ok_or_else(unparseable)?;
        let year = year.parse::<i32>().map_err(|_| unparseable())?;
        let month = month.parse::<u32>().map_err(|_| unparseable())?;
        MonthRef::new(year, month)
    }
}

/// Number of days in the given month, e.g. 29 for February 2024.
///
/// Pure Gregorian arithmetic, valid for any year. `month` outside `1..=12`
/// yields 0.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Builds the date for `day` in the given month, clamping overflowing days to
/// the last day of the month (day 31 in April becomes April 30).
pub fn clamp_day(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let day = day.clamp(1, days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

/// First date on or after `from` that falls on `weekday`.
pub fn weekday_on_or_after(from: NaiveDate, weekday: Weekday) -> NaiveDate {
    let current = from.weekday().num_days_from_monday() as i64;
    let target = weekday.num_days_from_monday() as i64;
    from + Duration::days((target - current).rem_euclid(7))
}
