//! Services that mutate fixed expenses through a repository.
//!
//! Every mutation reads the aggregate, applies an invariant-checked change, and
//! saves it against the version observed at read time so concurrent writers
//! are rejected rather than merged.

use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use schedule_domain::{FixedExpense, Identifiable, RangeChange, RecurrenceRange};

use crate::{
    storage::{ExpenseRepository, ReconciliationStore},
    CoreError,
};

pub struct ExpenseService;

impl ExpenseService {
    /// Stores a newly created expense and returns its identifier.
    pub fn create(repo: &dyn ExpenseRepository, expense: FixedExpense) -> Result<Uuid, CoreError> {
        expense.validate()?;
        let id = expense.id();
        repo.insert(expense)?;
        info!(expense = %id, "created fixed expense");
        Ok(id)
    }

    /// Adds a new recurrence range to the expense identified by `id`.
    pub fn add_range(
        repo: &dyn ExpenseRepository,
        id: Uuid,
        range: RecurrenceRange,
    ) -> Result<RangeChange, CoreError> {
        let change = Self::update(repo, id, |expense| Ok(expense.add_range(range)?))?;
        info!(expense = %id, ?change, start = %range.start_date(), "added range");
        Ok(change)
    }

    pub fn set_enabled(
        repo: &dyn ExpenseRepository,
        id: Uuid,
        enabled: bool,
    ) -> Result<(), CoreError> {
        Self::update(repo, id, |expense| {
            expense.set_enabled(enabled);
            Ok(())
        })?;
        info!(expense = %id, enabled, "updated expense enablement");
        Ok(())
    }

    /// Recomputes the reconciliation watermark from every record held for the expense.
    pub fn sync_watermark(
        repo: &dyn ExpenseRepository,
        reconciliations: &dyn ReconciliationStore,
        id: Uuid,
    ) -> Result<Option<NaiveDate>, CoreError> {
        let dates: Vec<NaiveDate> = reconciliations
            .records_for_expense(id)?
            .into_iter()
            .map(|record| record.reference_date)
            .collect();
        Self::update(repo, id, |expense| {
            expense.recompute_watermark(dates);
            Ok(expense.last_reconciled_date())
        })
    }

    /// Loads, mutates, and saves an expense. Nothing is written if `apply` fails.
    pub fn update<T, F>(repo: &dyn ExpenseRepository, id: Uuid, apply: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut FixedExpense) -> Result<T, CoreError>,
    {
        let mut expense = repo.get(id)?.ok_or(CoreError::ExpenseNotFound(id))?;
        let expected_version = expense.version();
        let outcome = apply(&mut expense)?;
        if expense.version() != expected_version {
            repo.save(&expense, expected_version)?;
        }
        Ok(outcome)
    }
}
