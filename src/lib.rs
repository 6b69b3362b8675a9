#![doc(test(attr(deny(warnings))))]

//! Expense Schedule answers "what recurring obligations are due this month,
//! and which of them are settled" for a store of fixed expenses.
//!
//! The engine lives in the `schedule-*` workspace crates; this crate wires
//! them together with logging, configuration, and plain-text reporting.

pub mod errors;
pub mod report;
pub mod utils;

pub use schedule_config as config;
pub use schedule_core as engine;
pub use schedule_domain as domain;
pub use schedule_storage_json as storage;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing with the default filter.
pub fn init() {
    init_with_filter(None);
}

/// Initializes global tracing, preferring `RUST_LOG`, then `filter`.
/// Only the first call has any effect.
pub fn init_with_filter(filter: Option<&str>) {
    INIT_TRACING.call_once(|| {
        utils::init_tracing(filter);
        tracing::debug!("Expense Schedule tracing initialized.");
    });
}

/// Build metadata captured by `build.rs`.
pub fn build_info() -> String {
    format!(
        "{} ({} {}, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("EXPENSE_SCHEDULE_BUILD_HASH"),
        env!("EXPENSE_SCHEDULE_BUILD_PROFILE"),
        env!("EXPENSE_SCHEDULE_BUILD_TIMESTAMP"),
    )
}
