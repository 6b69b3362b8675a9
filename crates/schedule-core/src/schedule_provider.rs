//! Materializes the monthly schedule: generated occurrences for every enabled
//! fixed expense, merged with reconciliation state and resolved currencies.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fmt,
};

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use schedule_domain::{
    CurrencyCode, EntryState, FixedExpense, FundingSource, Identifiable, MonthRef, NamedEntity,
    ReconciliationRecord,
};

use crate::{
    occurrence_generator::generate_occurrences,
    storage::{AccountLookup, FixedExpenseStore, ReconciliationStore},
    time::Clock,
    CoreError,
};

/// Days ahead of the reference date that count as "due soon".
pub const DEFAULT_DUE_SOON_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueStatus {
    Overdue,
    DueSoon,
    Upcoming,
    /// Paid, manually paid, or ignored.
    Settled,
}

impl DueStatus {
    fn classify(entry: &ScheduleEntry, today: NaiveDate, due_soon_days: i64) -> DueStatus {
        if !entry.state.is_outstanding() {
            return DueStatus::Settled;
        }
        if entry.reference_date < today {
            return DueStatus::Overdue;
        }
        // A window past the end of the calendar covers every remaining date.
        let limit =
            Duration::try_days(due_soon_days).and_then(|span| today.checked_add_signed(span));
        let due_soon = match limit {
            Some(limit) => entry.reference_date <= limit,
            None => due_soon_days > 0,
        };
        if due_soon {
            DueStatus::DueSoon
        } else {
            DueStatus::Upcoming
        }
    }
}

impl fmt::Display for DueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DueStatus::Overdue => "Overdue",
            DueStatus::DueSoon => "Due soon",
            DueStatus::Upcoming => "Upcoming",
            DueStatus::Settled => "Settled",
        };
        f.write_str(label)
    }
}

/// One materialized occurrence in a monthly schedule. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleEntry {
    pub expense_id: Uuid,
    pub expense_name: String,
    pub category_id: Uuid,
    pub reference_date: NaiveDate,
    pub amount_min: f64,
    pub amount_max: f64,
    /// `None` when the bound account could not be resolved.
    pub currency: Option<CurrencyCode>,
    pub account_ref: Option<Uuid>,
    pub state: EntryState,
    pub settlement_ref: Option<Uuid>,
}

impl ScheduleEntry {
    pub fn due_status(&self, today: NaiveDate, due_soon_days: i64) -> DueStatus {
        DueStatus::classify(self, today, due_soon_days)
    }
}

/// Problems found while building a schedule that degraded, but did not abort, the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DataIntegrityIssue {
    UnresolvedAccount { expense_id: Uuid, account_id: Uuid },
}

impl fmt::Display for DataIntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataIntegrityIssue::UnresolvedAccount {
                expense_id,
                account_id,
            } => write!(
                f,
                "expense {expense_id} references unknown account {account_id}"
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AmountTotals {
    pub min: f64,
    pub max: f64,
}

/// Aggregates over a month's entries. Ignored entries are counted but not summed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScheduleTotals {
    pub by_currency: BTreeMap<CurrencyCode, AmountTotals>,
    pub outstanding_by_currency: BTreeMap<CurrencyCode, AmountTotals>,
    pub unresolved_currency: usize,
    pub outstanding: usize,
    pub paid: usize,
    pub manually_paid: usize,
    pub ignored: usize,
}

impl ScheduleTotals {
    fn from_entries(entries: &[ScheduleEntry]) -> Self {
        let mut totals = ScheduleTotals::default();
        for entry in entries {
            match entry.state {
                EntryState::Empty => totals.outstanding += 1,
                EntryState::Paid => totals.paid += 1,
                EntryState::ManuallyPaid => totals.manually_paid += 1,
                EntryState::Ignored => totals.ignored += 1,
            }
            if entry.state == EntryState::Ignored {
                continue;
            }
            let Some(currency) = entry.currency.as_ref() else {
                totals.unresolved_currency += 1;
                continue;
            };
            let sum = totals.by_currency.entry(currency.clone()).or_default();
            sum.min += entry.amount_min;
            sum.max += entry.amount_max;
            if entry.state.is_outstanding() {
                let open = totals
                    .outstanding_by_currency
                    .entry(currency.clone())
                    .or_default();
                open.min += entry.amount_min;
                open.max += entry.amount_max;
            }
        }
        totals
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySchedule {
    pub month: MonthRef,
    /// Ordered by reference date ascending.
    pub entries: Vec<ScheduleEntry>,
    pub totals: ScheduleTotals,
    pub issues: Vec<DataIntegrityIssue>,
    /// Reconciliation records in the month that matched no generated entry.
    pub skipped_records: usize,
}

impl MonthlySchedule {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fails with the first recorded data-integrity issue, if any.
    pub fn into_consistent(self) -> Result<Self, CoreError> {
        match self.issues.first() {
            Some(issue) => Err(CoreError::DataIntegrity(issue.to_string())),
            None => Ok(self),
        }
    }
}

/// Builds monthly schedules from the expense, reconciliation, and account collaborators.
pub struct ScheduleProvider<'a> {
    expenses: &'a dyn FixedExpenseStore,
    reconciliations: &'a dyn ReconciliationStore,
    accounts: &'a dyn AccountLookup,
}

impl<'a> ScheduleProvider<'a> {
    pub fn new(
        expenses: &'a dyn FixedExpenseStore,
        reconciliations: &'a dyn ReconciliationStore,
        accounts: &'a dyn AccountLookup,
    ) -> Self {
        Self {
            expenses,
            reconciliations,
            accounts,
        }
    }

    /// Schedule for the month containing `clock.today()`.
    pub fn current_schedule(&self, clock: &dyn Clock) -> Result<MonthlySchedule, CoreError> {
        self.monthly_schedule(MonthRef::of(clock.today()))
    }

    pub fn monthly_schedule(&self, month: MonthRef) -> Result<MonthlySchedule, CoreError> {
        let window = month.window();
        let expenses = self.expenses.enabled_expenses()?;
        let records = self.reconciliations.records_in_window(&window)?;
        let index = index_records(&records);

        let mut entries = Vec::new();
        let mut issues = Vec::new();
        let mut matched = HashSet::new();

        for expense in expenses.iter().filter(|expense| expense.is_enabled()) {
            let occurrences = generate_occurrences(expense, &window);
            if occurrences.is_empty() {
                continue;
            }
            debug!(
                expense = %expense.id(),
                month = %month,
                occurrences = occurrences.len(),
                "generated occurrences"
            );
            let (currency, account_ref) = self.resolve_currency(expense, &mut issues)?;

            for occurrence in occurrences {
                let key = (expense.id(), occurrence.reference_date);
                let record = index.get(&key).copied();
                if record.is_some() {
                    matched.insert(key);
                }
                entries.push(ScheduleEntry {
                    expense_id: expense.id(),
                    expense_name: expense.name().to_string(),
                    category_id: expense.category_id(),
                    reference_date: occurrence.reference_date,
                    amount_min: occurrence.amount_min,
                    amount_max: occurrence.amount_max,
                    currency: currency.clone(),
                    account_ref,
                    state: record.map_or(EntryState::Empty, |r| r.state.into()),
                    settlement_ref: record.and_then(|r| r.settlement_ref),
                });
            }
        }

        let skipped_records = index.len() - matched.len();
        if skipped_records > 0 {
            for key in index.keys().filter(|key| !matched.contains(*key)) {
                debug!(
                    expense = %key.0,
                    reference_date = %key.1,
                    "skipping reconciliation record without a matching occurrence"
                );
            }
        }

        entries.sort_by(|a, b| {
            a.reference_date
                .cmp(&b.reference_date)
                .then_with(|| a.expense_name.cmp(&b.expense_name))
                .then_with(|| a.expense_id.cmp(&b.expense_id))
        });
        let totals = ScheduleTotals::from_entries(&entries);

        Ok(MonthlySchedule {
            month,
            entries,
            totals,
            issues,
            skipped_records,
        })
    }

    fn resolve_currency(
        &self,
        expense: &FixedExpense,
        issues: &mut Vec<DataIntegrityIssue>,
    ) -> Result<(Option<CurrencyCode>, Option<Uuid>), CoreError> {
        match expense.funding() {
            FundingSource::Currency(code) => Ok((Some(code.clone()), None)),
            FundingSource::Account(account_id) => match self.accounts.account(*account_id)? {
                Some(account) => Ok((Some(account.currency), Some(*account_id))),
                None => {
                    let issue = DataIntegrityIssue::UnresolvedAccount {
                        expense_id: expense.id(),
                        account_id: *account_id,
                    };
                    warn!(%issue, "emitting entries without a resolved currency");
                    issues.push(issue);
                    Ok((None, Some(*account_id)))
                }
            },
        }
    }
}

/// Indexes records by `(expense, reference date)`; later duplicates win.
fn index_records(records: &[ReconciliationRecord]) -> HashMap<(Uuid, NaiveDate), &ReconciliationRecord> {
    let mut index = HashMap::with_capacity(records.len());
    for record in records {
        let key = (record.expense_id, record.reference_date);
        if index.insert(key, record).is_some() {
            warn!(
                expense = %record.expense_id,
                reference_date = %record.reference_date,
                "duplicate reconciliation record, keeping the latest"
            );
        }
    }
    index
}
