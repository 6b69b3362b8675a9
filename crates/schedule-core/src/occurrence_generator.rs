//! Occurrence generation: turns a fixed expense's range history into the
//! reference dates that fall due inside a window.

use chrono::{Datelike, Duration, NaiveDate};

use schedule_domain::{
    weekday_on_or_after, Anchor, DateWindow, FixedExpense, MonthRef, Period, RecurrenceRange,
};

/// Months searched by [`next_occurrence_on_or_after`] before giving up.
pub const DEFAULT_SEARCH_HORIZON_MONTHS: u32 = 24;

/// One due date produced for a fixed expense, with the governing range's amounts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Occurrence {
    pub reference_date: NaiveDate,
    pub amount_min: f64,
    pub amount_max: f64,
    /// Position of the governing range in the expense's history.
    pub range_index: usize,
}

/// Generates the occurrences of `expense` inside `window`, ascending by date.
///
/// Ranges are walked in chronological order starting with the one effective at
/// `window.start`. Each range only emits dates in `[start_date, next_start)`,
/// so when two ranges meet on a day the later-started one owns it. A cursor
/// over the last accepted date guarantees at most one occurrence per day.
pub fn generate_occurrences(expense: &FixedExpense, window: &DateWindow) -> Vec<Occurrence> {
    let ranges = expense.ranges();
    let first = expense.effective_index(window.start).unwrap_or(0);
    let mut occurrences = Vec::new();
    let mut cursor: Option<NaiveDate> = None;

    for (index, range) in ranges.iter().enumerate().skip(first) {
        if range.start_date() > window.end {
            break;
        }
        let effective_end = expense.effective_end(index);
        let (amount_min, amount_max) = range.amount().bounds();

        for candidate in candidate_dates(range, window) {
            if candidate < range.start_date() {
                continue;
            }
            if effective_end.is_some_and(|end| candidate >= end) {
                continue;
            }
            if cursor.is_some_and(|last| candidate <= last) {
                continue;
            }
            cursor = Some(candidate);
            occurrences.push(Occurrence {
                reference_date: candidate,
                amount_min,
                amount_max,
                range_index: index,
            });
        }
    }

    occurrences.sort_by_key(|occurrence| occurrence.reference_date);
    occurrences
}

/// First occurrence on or after `from`, searching up to `horizon_months` calendar months.
pub fn next_occurrence_on_or_after(
    expense: &FixedExpense,
    from: NaiveDate,
    horizon_months: u32,
) -> Option<Occurrence> {
    let mut month = MonthRef::of(from);
    for _ in 0..horizon_months.max(1) {
        let window = DateWindow {
            start: from.max(month.first_day()),
            end: month.last_day(),
        };
        if let Some(found) = generate_occurrences(expense, &window).into_iter().next() {
            return Some(found);
        }
        month = month.next()?;
    }
    None
}

/// Raw candidate dates for one range inside the window, before history filtering.
fn candidate_dates(range: &RecurrenceRange, window: &DateWindow) -> Vec<NaiveDate> {
    match (range.period(), range.anchor()) {
        (Period::Monthly, Anchor::DayOfMonth(day)) => window
            .months()
            .into_iter()
            .map(|month| month.day(day))
            .filter(|date| window.contains(*date))
            .collect(),
        (Period::Yearly, Anchor::DayOfMonth(day)) => window
            .months()
            .into_iter()
            .filter(|month| month.month() == range.start_date().month())
            .map(|month| month.day(day))
            .filter(|date| window.contains(*date))
            .collect(),
        (Period::Weekly | Period::Biweekly, Anchor::DayOfWeek(weekday)) => {
            let step = range.period().cadence_days().unwrap_or(7);
            let phase = weekday_on_or_after(range.start_date(), weekday);
            stepped_dates(phase, step, window)
        }
        // Ranges are validated on construction; a mismatched anchor never reaches here.
        _ => Vec::new(),
    }
}

/// Dates `phase + k * step` (k >= 0) that fall inside the window.
fn stepped_dates(phase: NaiveDate, step: i64, window: &DateWindow) -> Vec<NaiveDate> {
    let mut date = if phase >= window.start {
        phase
    } else {
        let behind = (window.start - phase).num_days();
        let steps = (behind + step - 1) / step;
        phase + Duration::days(steps * step)
    };
    let mut dates = Vec::new();
    while date <= window.end {
        dates.push(date);
        date += Duration::days(step);
    }
    dates
}
