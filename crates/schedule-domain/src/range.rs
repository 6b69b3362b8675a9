//! Recurrence ranges: one immutable version of a fixed expense's schedule and amount rule.

use std::fmt;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
/// Enumerates the supported recurrence cadences.
pub enum Period {
    Weekly,
    Biweekly,
    Monthly,
    Yearly,
}

impl Period {
    /// Day spacing for the weekday-anchored cadences.
    pub fn cadence_days(self) -> Option<i64> {
        match self {
            Period::Weekly => Some(7),
            Period::Biweekly => Some(14),
            Period::Monthly | Period::Yearly => None,
        }
    }

    /// Whether the period is anchored on a weekday rather than a day of month.
    pub fn is_weekday_anchored(self) -> bool {
        self.cadence_days().is_some()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Period::Weekly => "Weekly",
            Period::Biweekly => "Biweekly",
            Period::Monthly => "Monthly",
            Period::Yearly => "Yearly",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
/// Day a recurrence falls on within its cadence.
pub enum Anchor {
    /// Day of month, 1 through 31. Clamped to shorter months at generation time.
    DayOfMonth(u32),
    DayOfWeek(Weekday),
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anchor::DayOfMonth(day) => write!(f, "day {day}"),
            Anchor::DayOfWeek(weekday) => write!(f, "{weekday}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
/// How much an occurrence is expected to cost.
pub enum AmountMode {
    Fixed { amount: f64 },
    Ranged { min: f64, max: f64 },
}

impl AmountMode {
    /// Returns `(min, max)`; both bounds are equal for fixed amounts.
    pub fn bounds(&self) -> (f64, f64) {
        match *self {
            AmountMode::Fixed { amount } => (amount, amount),
            AmountMode::Ranged { min, max } => (min, max),
        }
    }

    fn validate(&self) -> Result<(), RangeError> {
        let (min, max) = self.bounds();
        if !min.is_finite() || !max.is_finite() || min < 0.0 {
            return Err(RangeError::InvalidAmount { min, max });
        }
        if min > max {
            return Err(RangeError::InvertedAmount { min, max });
        }
        Ok(())
    }
}

impl fmt::Display for AmountMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountMode::Fixed { amount } => write!(f, "{amount:.2}"),
            AmountMode::Ranged { min, max } => write!(f, "{min:.2}..{max:.2}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
/// Construction-time failures for a [`RecurrenceRange`].
pub enum RangeError {
    #[error("{period} recurrence cannot be anchored on {anchor}")]
    AnchorMismatch { period: Period, anchor: Anchor },
    #[error("day of month {0} is outside 1..=31")]
    DayOutOfBounds(u32),
    #[error("amount bounds {min}..{max} must be finite and non-negative")]
    InvalidAmount { min: f64, max: f64 },
    #[error("minimum amount {min} exceeds maximum {max}")]
    InvertedAmount { min: f64, max: f64 },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
/// One version of a recurrence rule, active from `start_date` until superseded.
pub struct RecurrenceRange {
    amount: AmountMode,
    period: Period,
    anchor: Anchor,
    start_date: NaiveDate,
}

impl RecurrenceRange {
    pub fn new(
        amount: AmountMode,
        period: Period,
        anchor: Anchor,
        start_date: NaiveDate,
    ) -> Result<Self, RangeError> {
        let range = Self {
            amount,
            period,
            anchor,
            start_date,
        };
        range.validate()?;
        Ok(range)
    }

    pub fn monthly(amount: AmountMode, day: u32, start_date: NaiveDate) -> Result<Self, RangeError> {
        Self::new(amount, Period::Monthly, Anchor::DayOfMonth(day), start_date)
    }

    pub fn yearly(amount: AmountMode, day: u32, start_date: NaiveDate) -> Result<Self, RangeError> {
        Self::new(amount, Period::Yearly, Anchor::DayOfMonth(day), start_date)
    }

    pub fn weekly(
        amount: AmountMode,
        weekday: Weekday,
        start_date: NaiveDate,
    ) -> Result<Self, RangeError> {
        Self::new(amount, Period::Weekly, Anchor::DayOfWeek(weekday), start_date)
    }

    pub fn biweekly(
        amount: AmountMode,
        weekday: Weekday,
        start_date: NaiveDate,
    ) -> Result<Self, RangeError> {
        Self::new(amount, Period::Biweekly, Anchor::DayOfWeek(weekday), start_date)
    }

    pub fn amount(&self) -> AmountMode {
        self.amount
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Re-checks the invariants enforced by [`RecurrenceRange::new`].
    pub fn validate(&self) -> Result<(), RangeError> {
        match (self.period.is_weekday_anchored(), self.anchor) {
            (false, Anchor::DayOfMonth(day)) if !(1..=31).contains(&day) => {
                return Err(RangeError::DayOutOfBounds(day));
            }
            (false, Anchor::DayOfMonth(_)) | (true, Anchor::DayOfWeek(_)) => {}
            _ => {
                return Err(RangeError::AnchorMismatch {
                    period: self.period,
                    anchor: self.anchor,
                });
            }
        }
        self.amount.validate()
    }
}

impl fmt::Display for RecurrenceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on {} from {} ({})",
            self.period, self.anchor, self.start_date, self.amount
        )
    }
}
