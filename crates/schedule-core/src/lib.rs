//! schedule-core
//!
//! Recurring-obligation schedule engine: occurrence generation, monthly
//! schedule materialization, and invariant-checked expense mutations.
//! Depends on schedule-domain. No CLI, no terminal I/O, no direct file access.

pub mod error;
pub mod expense_service;
pub mod memory_store;
pub mod occurrence_generator;
pub mod schedule_provider;
pub mod storage;
pub mod time;

pub use error::CoreError;
pub use expense_service::*;
pub use memory_store::*;
pub use occurrence_generator::*;
pub use schedule_provider::*;
pub use storage::*;
pub use time::*;
