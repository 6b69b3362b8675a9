//! Plain-text rendering of schedules for terminal output.

use std::fmt::Write;

use chrono::NaiveDate;

use schedule_core::{AmountTotals, MonthlySchedule, Occurrence, ScheduleEntry};
use schedule_domain::CurrencyCode;

const NAME_WIDTH: usize = 24;

/// Next due date of one expense, as shown by `schedule_cli next`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpcomingLine {
    pub expense_name: String,
    pub currency: Option<CurrencyCode>,
    pub occurrence: Option<Occurrence>,
}

pub fn render_schedule(schedule: &MonthlySchedule, today: NaiveDate, due_soon_days: i64) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Schedule for {}", schedule.month);

    if schedule.is_empty() {
        let _ = writeln!(out, "No entries.");
    }
    for entry in &schedule.entries {
        let _ = writeln!(out, "{}", entry_line(entry, today, due_soon_days));
    }

    let totals = &schedule.totals;
    if !totals.by_currency.is_empty() {
        let _ = writeln!(out, "Totals:");
        for (currency, sum) in &totals.by_currency {
            let open = totals
                .outstanding_by_currency
                .get(currency)
                .copied()
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "  {currency} {} (outstanding {})",
                format_totals(sum),
                format_totals(&open)
            );
        }
    }
    let _ = writeln!(
        out,
        "Entries: {} outstanding, {} paid, {} manually paid, {} ignored",
        totals.outstanding, totals.paid, totals.manually_paid, totals.ignored
    );
    if totals.unresolved_currency > 0 {
        let _ = writeln!(
            out,
            "{} entries without a resolved currency are not totaled",
            totals.unresolved_currency
        );
    }

    if !schedule.issues.is_empty() {
        let _ = writeln!(out, "Issues:");
        for issue in &schedule.issues {
            let _ = writeln!(out, "  {issue}");
        }
    }
    if schedule.skipped_records > 0 {
        let _ = writeln!(
            out,
            "{} reconciliation records matched no occurrence",
            schedule.skipped_records
        );
    }
    out
}

pub fn render_upcoming(lines: &[UpcomingLine], horizon_months: u32) -> String {
    let mut out = String::new();
    if lines.is_empty() {
        let _ = writeln!(out, "No enabled fixed expenses.");
    }
    for line in lines {
        match &line.occurrence {
            Some(occurrence) => {
                let _ = writeln!(
                    out,
                    "{:<width$} {}  {} {}",
                    line.expense_name,
                    occurrence.reference_date,
                    format_amount(occurrence.amount_min, occurrence.amount_max),
                    currency_label(line.currency.as_ref()),
                    width = NAME_WIDTH
                );
            }
            None => {
                let _ = writeln!(
                    out,
                    "{:<width$} none within {horizon_months} months",
                    line.expense_name,
                    width = NAME_WIDTH
                );
            }
        }
    }
    out
}

fn entry_line(entry: &ScheduleEntry, today: NaiveDate, due_soon_days: i64) -> String {
    format!(
        "{}  {:<width$} {} {}  {} ({})",
        entry.reference_date,
        entry.expense_name,
        format_amount(entry.amount_min, entry.amount_max),
        currency_label(entry.currency.as_ref()),
        entry.state,
        entry.due_status(today, due_soon_days),
        width = NAME_WIDTH
    )
}

fn format_totals(totals: &AmountTotals) -> String {
    format_amount(totals.min, totals.max)
}

fn format_amount(min: f64, max: f64) -> String {
    if (max - min).abs() < f64::EPSILON {
        format!("{min:.2}")
    } else {
        format!("{min:.2}-{max:.2}")
    }
}

fn currency_label(currency: Option<&CurrencyCode>) -> String {
    currency.map_or_else(|| "???".to_string(), |code| code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use schedule_core::{ExpenseService, MemoryStore, ScheduleProvider};
    use schedule_domain::{
        AmountMode, FixedExpense, MonthRef, ReconciliationRecord, ReconciliationState,
        RecurrenceRange,
    };
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn october_schedule() -> MonthlySchedule {
        let store = MemoryStore::new();
        let rent = FixedExpense::new(
            "Rent",
            Uuid::new_v4(),
            None,
            Some(CurrencyCode::new("EUR")),
            RecurrenceRange::monthly(AmountMode::Fixed { amount: 900.0 }, 1, date(2025, 1, 1))
                .unwrap(),
        )
        .unwrap();
        let power = FixedExpense::new(
            "Power",
            Uuid::new_v4(),
            None,
            Some(CurrencyCode::new("EUR")),
            RecurrenceRange::monthly(
                AmountMode::Ranged {
                    min: 40.0,
                    max: 70.0,
                },
                20,
                date(2025, 1, 1),
            )
            .unwrap(),
        )
        .unwrap();
        let rent_id = ExpenseService::create(&store, rent).unwrap();
        ExpenseService::create(&store, power).unwrap();
        store
            .record(ReconciliationRecord::new(
                rent_id,
                date(2025, 10, 1),
                ReconciliationState::Paid,
            ))
            .unwrap();
        ScheduleProvider::new(&store, &store, &store)
            .monthly_schedule(MonthRef::new(2025, 10).unwrap())
            .unwrap()
    }

    #[test]
    fn schedule_lists_entries_and_totals() {
        let text = render_schedule(&october_schedule(), date(2025, 10, 15), 7);

        assert!(text.starts_with("Schedule for 2025-10\n"));
        assert!(text.contains("2025-10-01  Rent"));
        assert!(text.contains("Paid (Settled)"));
        assert!(text.contains("40.00-70.00 EUR"));
        assert!(text.contains("Empty (Due soon)"));
        assert!(text.contains("EUR 940.00-970.00 (outstanding 40.00-70.00)"));
        assert!(text.contains("Entries: 1 outstanding, 1 paid, 0 manually paid, 0 ignored"));
    }

    #[test]
    fn empty_schedule_says_so() {
        let schedule = ScheduleProvider::new(
            &MemoryStore::new(),
            &MemoryStore::new(),
            &MemoryStore::new(),
        )
        .monthly_schedule(MonthRef::new(2025, 2).unwrap())
        .unwrap();

        let text = render_schedule(&schedule, date(2025, 2, 1), 7);
        assert!(text.contains("No entries."));
        assert!(!text.contains("Totals:"));
    }

    #[test]
    fn upcoming_reports_missing_occurrences() {
        let lines = vec![UpcomingLine {
            expense_name: "Insurance".into(),
            currency: None,
            occurrence: None,
        }];
        assert!(render_upcoming(&lines, 24).contains("none within 24 months"));
    }
}
