use chrono::{Datelike, NaiveDate, Weekday};
use schedule_core::{generate_occurrences, MemoryStore, ScheduleProvider};
use schedule_domain::{
    days_in_month, AmountMode, CurrencyCode, DateWindow, ExpenseError, FixedExpense, MonthRef,
    RangeChange, RecurrenceRange,
};
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn fixed(amount: f64) -> AmountMode {
    AmountMode::Fixed { amount }
}

fn expense_with(range: RecurrenceRange) -> FixedExpense {
    FixedExpense::new(
        "Property",
        Uuid::new_v4(),
        None,
        Some(CurrencyCode::new("USD")),
        range,
    )
    .unwrap()
}

#[test]
fn monthly_anchor_beyond_month_end_lands_on_last_day() {
    for anchor in 28..=31 {
        let expense =
            expense_with(RecurrenceRange::monthly(fixed(1.0), anchor, date(2024, 1, 1)).unwrap());
        let mut month = MonthRef::new(2024, 1).unwrap();
        for _ in 0..24 {
            let found = generate_occurrences(&expense, &month.window());
            assert_eq!(found.len(), 1, "{month} anchor {anchor}");
            let expected_day = anchor.min(days_in_month(month.year(), month.month()));
            assert_eq!(found[0].reference_date.day(), expected_day);
            month = month.next().unwrap();
        }
    }
}

#[test]
fn yearly_occurs_once_per_year_in_anchor_month() {
    let expense =
        expense_with(RecurrenceRange::yearly(fixed(250.0), 31, date(2023, 4, 2)).unwrap());
    for year in 2023..2028 {
        let mut hits = Vec::new();
        for month in 1..=12 {
            let window = DateWindow::month(year, month).unwrap();
            hits.extend(generate_occurrences(&expense, &window));
        }
        assert_eq!(hits.len(), 1, "year {year}");
        assert_eq!(hits[0].reference_date, date(year, 4, 30));
    }
}

#[test]
fn weekly_friday_example() {
    let expense =
        expense_with(RecurrenceRange::weekly(fixed(12.0), Weekday::Fri, date(2025, 10, 8)).unwrap());
    let found = generate_occurrences(&expense, &DateWindow::month(2025, 10).unwrap());
    let days: Vec<u32> = found.iter().map(|o| o.reference_date.day()).collect();
    assert_eq!(days, vec![10, 17, 24, 31]);
}

#[test]
fn biweekly_friday_example() {
    let expense = expense_with(
        RecurrenceRange::biweekly(fixed(12.0), Weekday::Fri, date(2025, 10, 8)).unwrap(),
    );
    let found = generate_occurrences(&expense, &DateWindow::month(2025, 10).unwrap());
    let days: Vec<u32> = found.iter().map(|o| o.reference_date.day()).collect();
    assert_eq!(days, vec![10, 24]);
}

#[test]
fn range_change_inside_window_splits_amounts_without_double_counting() {
    for (period_builder, switch_day) in [
        (0usize, 12u32),
        (0, 17),
        (1, 9),
        (1, 24),
    ] {
        let first = match period_builder {
            0 => RecurrenceRange::weekly(fixed(10.0), Weekday::Fri, date(2025, 1, 3)).unwrap(),
            _ => RecurrenceRange::monthly(fixed(10.0), 9, date(2025, 1, 1)).unwrap(),
        };
        let second = match period_builder {
            0 => RecurrenceRange::weekly(fixed(20.0), Weekday::Fri, date(2025, 10, switch_day))
                .unwrap(),
            _ => RecurrenceRange::monthly(fixed(20.0), 24, date(2025, 10, switch_day)).unwrap(),
        };
        let mut expense = expense_with(first);
        expense.record_reconciliation(date(2025, 9, 30));
        assert_eq!(expense.add_range(second).unwrap(), RangeChange::Appended);

        let found = generate_occurrences(&expense, &DateWindow::month(2025, 10).unwrap());
        let mut seen = std::collections::HashSet::new();
        for occurrence in &found {
            assert!(seen.insert(occurrence.reference_date), "duplicate date");
            let expected = if occurrence.reference_date < second.start_date() {
                10.0
            } else {
                20.0
            };
            assert_eq!(occurrence.amount_min, expected, "{}", occurrence.reference_date);
        }
        assert!(!found.is_empty());
    }
}

#[test]
fn add_range_respects_watermark_and_last_start() {
    let mut expense =
        expense_with(RecurrenceRange::monthly(fixed(10.0), 1, date(2025, 1, 1)).unwrap());
    expense.record_reconciliation(date(2025, 5, 1));

    for start in [date(2025, 1, 1), date(2025, 3, 1), date(2025, 5, 1)] {
        let range = RecurrenceRange::monthly(fixed(11.0), 1, start).unwrap();
        assert!(matches!(
            expense.add_range(range),
            Err(ExpenseError::InvalidRange { .. })
        ));
    }
    let range = RecurrenceRange::monthly(fixed(11.0), 1, date(2025, 5, 2)).unwrap();
    assert!(expense.add_range(range).is_ok());
}

#[test]
fn compaction_never_grows_over_unused_ranges() {
    let mut expense =
        expense_with(RecurrenceRange::monthly(fixed(10.0), 1, date(2025, 1, 1)).unwrap());
    let mut count = expense.ranges().len();
    for (offset, reconcile) in [(1u32, false), (2, true), (3, false), (4, false), (5, true), (6, false)] {
        if reconcile {
            let last_start = expense.last_range().unwrap().start_date();
            expense.record_reconciliation(last_start);
        }
        let used = expense.last_range_in_use();
        let range =
            RecurrenceRange::monthly(fixed(10.0 + offset as f64), 1, date(2025, 1 + offset, 1))
                .unwrap();
        expense.add_range(range).unwrap();
        let expected = if used { count + 1 } else { count };
        assert_eq!(expense.ranges().len(), expected);
        count = expected;
    }
}

#[test]
fn monthly_schedule_is_idempotent() {
    let store = MemoryStore::new();
    let expense =
        expense_with(RecurrenceRange::biweekly(fixed(12.0), Weekday::Mon, date(2025, 1, 6)).unwrap());
    schedule_core::ExpenseService::create(&store, expense).unwrap();
    let provider = ScheduleProvider::new(&store, &store, &store);
    let month = MonthRef::new(2025, 10).unwrap();
    assert_eq!(
        provider.monthly_schedule(month).unwrap(),
        provider.monthly_schedule(month).unwrap()
    );
}
