//! In-memory implementation of every collaborator contract.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use schedule_domain::{AccountRef, DateWindow, FixedExpense, Identifiable, ReconciliationRecord};

use crate::{
    storage::{AccountLookup, ExpenseRepository, FixedExpenseStore, ReconciliationStore},
    CoreError,
};

/// Everything the schedule reads, as one serializable value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    #[serde(default)]
    pub expenses: Vec<FixedExpense>,
    #[serde(default)]
    pub reconciliations: Vec<ReconciliationRecord>,
    #[serde(default)]
    pub accounts: Vec<AccountRef>,
}

impl Snapshot {
    /// Describes dangling references and other anomalies in the snapshot.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for expense in &self.expenses {
            if let Some(account_id) = expense.funding().account() {
                if !self.accounts.iter().any(|account| account.id == account_id) {
                    warnings.push(format!(
                        "expense {} references unknown account {}",
                        expense.id(),
                        account_id
                    ));
                }
            }
        }
        for record in &self.reconciliations {
            if !self.expenses.iter().any(|e| e.id() == record.expense_id) {
                warnings.push(format!(
                    "reconciliation on {} references missing expense {}",
                    record.reference_date, record.expense_id
                ));
            }
        }
        warnings
    }
}

/// Thread-safe store backed by a [`Snapshot`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            inner: RwLock::new(snapshot),
        }
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> Result<Snapshot, CoreError> {
        Ok(self.read()?.clone())
    }

    /// Swaps in `snapshot` wholesale, e.g. to roll back a change that could not be persisted.
    pub fn replace(&self, snapshot: Snapshot) -> Result<(), CoreError> {
        *self.write()? = snapshot;
        Ok(())
    }

    pub fn add_account(&self, account: AccountRef) -> Result<(), CoreError> {
        let mut snapshot = self.write()?;
        snapshot.accounts.retain(|existing| existing.id != account.id);
        snapshot.accounts.push(account);
        Ok(())
    }

    /// Stores a reconciliation outcome, replacing any record for the same
    /// occurrence, and advances the owning expense's watermark.
    pub fn record(&self, record: ReconciliationRecord) -> Result<(), CoreError> {
        let mut snapshot = self.write()?;
        snapshot.reconciliations.retain(|existing| {
            (existing.expense_id, existing.reference_date)
                != (record.expense_id, record.reference_date)
        });
        if let Some(expense) = snapshot
            .expenses
            .iter_mut()
            .find(|expense| expense.id() == record.expense_id)
        {
            expense.record_reconciliation(record.reference_date);
        }
        snapshot.reconciliations.push(record);
        Ok(())
    }

    /// Drops the record for one occurrence, returning whether it existed.
    pub fn revert(
        &self,
        expense_id: Uuid,
        reference_date: NaiveDate,
    ) -> Result<bool, CoreError> {
        let mut snapshot = self.write()?;
        let before = snapshot.reconciliations.len();
        snapshot.reconciliations.retain(|existing| {
            (existing.expense_id, existing.reference_date) != (expense_id, reference_date)
        });
        Ok(snapshot.reconciliations.len() != before)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Snapshot>, CoreError> {
        self.inner
            .read()
            .map_err(|_| CoreError::Storage("schedule store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Snapshot>, CoreError> {
        self.inner
            .write()
            .map_err(|_| CoreError::Storage("schedule store lock poisoned".into()))
    }
}

impl FixedExpenseStore for MemoryStore {
    fn enabled_expenses(&self) -> Result<Vec<FixedExpense>, CoreError> {
        Ok(self
            .read()?
            .expenses
            .iter()
            .filter(|expense| expense.is_enabled())
            .cloned()
            .collect())
    }
}

impl ExpenseRepository for MemoryStore {
    fn get(&self, id: Uuid) -> Result<Option<FixedExpense>, CoreError> {
        Ok(self
            .read()?
            .expenses
            .iter()
            .find(|expense| expense.id() == id)
            .cloned())
    }

    fn insert(&self, expense: FixedExpense) -> Result<(), CoreError> {
        let mut snapshot = self.write()?;
        if snapshot.expenses.iter().any(|e| e.id() == expense.id()) {
            return Err(CoreError::Storage(format!(
                "fixed expense {} already exists",
                expense.id()
            )));
        }
        snapshot.expenses.push(expense);
        Ok(())
    }

    fn save(&self, expense: &FixedExpense, expected_version: u64) -> Result<(), CoreError> {
        let mut snapshot = self.write()?;
        let stored = snapshot
            .expenses
            .iter_mut()
            .find(|stored| stored.id() == expense.id())
            .ok_or(CoreError::ExpenseNotFound(expense.id()))?;
        if stored.version() != expected_version {
            return Err(CoreError::VersionConflict {
                id: expense.id(),
                expected: expected_version,
                found: stored.version(),
            });
        }
        *stored = expense.clone();
        Ok(())
    }

    fn remove(&self, id: Uuid) -> Result<bool, CoreError> {
        let mut snapshot = self.write()?;
        let before = snapshot.expenses.len();
        snapshot.expenses.retain(|expense| expense.id() != id);
        Ok(snapshot.expenses.len() != before)
    }
}

impl ReconciliationStore for MemoryStore {
    fn records_in_window(&self, window: &DateWindow) -> Result<Vec<ReconciliationRecord>, CoreError> {
        Ok(self
            .read()?
            .reconciliations
            .iter()
            .filter(|record| window.contains(record.reference_date))
            .cloned()
            .collect())
    }

    fn records_for_expense(&self, expense_id: Uuid) -> Result<Vec<ReconciliationRecord>, CoreError> {
        Ok(self
            .read()?
            .reconciliations
            .iter()
            .filter(|record| record.expense_id == expense_id)
            .cloned()
            .collect())
    }
}

impl AccountLookup for MemoryStore {
    fn account(&self, account_id: Uuid) -> Result<Option<AccountRef>, CoreError> {
        Ok(self
            .read()?
            .accounts
            .iter()
            .find(|account| account.id == account_id)
            .cloned())
    }
}
