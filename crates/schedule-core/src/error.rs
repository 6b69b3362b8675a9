use chrono::NaiveDate;
use schedule_domain::{ExpenseError, WindowError};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid range: start {start} must be after {floor}")]
    InvalidRange { start: NaiveDate, floor: NaiveDate },
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),
    #[error("Fixed expense not found: {0}")]
    ExpenseNotFound(Uuid),
    #[error("Version conflict on {id}: expected {expected}, found {found}")]
    VersionConflict { id: Uuid, expected: u64, found: u64 },
    #[error("Invalid window: {0}")]
    Window(#[from] WindowError),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ExpenseError> for CoreError {
    fn from(err: ExpenseError) -> Self {
        match err {
            ExpenseError::InvalidRange { start, floor } => CoreError::InvalidRange { start, floor },
            ExpenseError::Configuration(message) => CoreError::Configuration(message),
            ExpenseError::Range(inner) => CoreError::Validation(inner.to_string()),
        }
    }
}
