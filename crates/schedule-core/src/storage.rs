//! Collaborator contracts the schedule engine reads from and writes through.
//!
//! Implementations load whatever backing data they need up front; the engine
//! calls these synchronously and never interleaves I/O with generation.

use uuid::Uuid;

use schedule_domain::{AccountRef, DateWindow, FixedExpense, ReconciliationRecord};

use crate::CoreError;

/// Source of fixed expenses eligible for generation.
pub trait FixedExpenseStore: Send + Sync {
    fn enabled_expenses(&self) -> Result<Vec<FixedExpense>, CoreError>;
}

/// Read/write access to fixed expenses with optimistic version checks.
pub trait ExpenseRepository: FixedExpenseStore {
    fn get(&self, id: Uuid) -> Result<Option<FixedExpense>, CoreError>;
    fn insert(&self, expense: FixedExpense) -> Result<(), CoreError>;
    /// Persists `expense` only if the stored copy still carries `expected_version`.
    fn save(&self, expense: &FixedExpense, expected_version: u64) -> Result<(), CoreError>;
    fn remove(&self, id: Uuid) -> Result<bool, CoreError>;
}

/// External ledger of reconciliation outcomes.
pub trait ReconciliationStore: Send + Sync {
    /// Records whose reference date falls inside `window`.
    fn records_in_window(&self, window: &DateWindow) -> Result<Vec<ReconciliationRecord>, CoreError>;
    fn records_for_expense(&self, expense_id: Uuid) -> Result<Vec<ReconciliationRecord>, CoreError>;
}

/// Account master-data lookup.
pub trait AccountLookup: Send + Sync {
    fn account(&self, account_id: Uuid) -> Result<Option<AccountRef>, CoreError>;
}
