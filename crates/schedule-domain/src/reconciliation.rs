//! Externally maintained reconciliation records and the entry states they map to.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
/// Outcome recorded against one occurrence of a fixed expense.
pub enum ReconciliationState {
    /// Settled by a recorded transaction.
    Paid,
    Ignored,
    /// Marked as paid without a settlement transaction.
    ManuallyPaid,
}

impl fmt::Display for ReconciliationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReconciliationState::Paid => "Paid",
            ReconciliationState::Ignored => "Ignored",
            ReconciliationState::ManuallyPaid => "Manually Paid",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconciliationRecord {
    pub expense_id: Uuid,
    pub reference_date: NaiveDate,
    pub state: ReconciliationState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settlement_ref: Option<Uuid>,
}

impl ReconciliationRecord {
    pub fn new(expense_id: Uuid, reference_date: NaiveDate, state: ReconciliationState) -> Self {
        Self {
            expense_id,
            reference_date,
            state,
            settlement_ref: None,
        }
    }

    pub fn with_settlement(mut self, settlement_ref: Uuid) -> Self {
        self.settlement_ref = Some(settlement_ref);
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
/// State exposed on a schedule entry. `Empty` means nothing was recorded yet.
pub enum EntryState {
    #[default]
    Empty,
    Paid,
    Ignored,
    ManuallyPaid,
}

impl EntryState {
    /// Whether the occurrence still awaits an outcome.
    pub fn is_outstanding(self) -> bool {
        matches!(self, EntryState::Empty)
    }
}

impl From<ReconciliationState> for EntryState {
    fn from(state: ReconciliationState) -> Self {
        match state {
            ReconciliationState::Paid => EntryState::Paid,
            ReconciliationState::Ignored => EntryState::Ignored,
            ReconciliationState::ManuallyPaid => EntryState::ManuallyPaid,
        }
    }
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntryState::Empty => "Empty",
            EntryState::Paid => "Paid",
            EntryState::Ignored => "Ignored",
            EntryState::ManuallyPaid => "Manually Paid",
        };
        f.write_str(label)
    }
}
