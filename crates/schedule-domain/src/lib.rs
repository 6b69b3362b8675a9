//! schedule-domain
//!
//! Pure domain models for recurring fixed expenses (recurrence ranges, the
//! FixedExpense aggregate, reconciliation records, calendar windows).
//! No I/O, no CLI, no storage. Only data types, invariants, and core enums.

pub mod account;
pub mod common;
pub mod expense;
pub mod range;
pub mod reconciliation;

pub use account::*;
pub use common::*;
pub use expense::*;
pub use range::*;
pub use reconciliation::*;
