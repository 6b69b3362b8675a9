use thiserror::Error;

use schedule_config::ConfigError;
use schedule_core::CoreError;
use schedule_domain::WindowError;

/// Failures surfaced by the command-line front end.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Window(#[from] WindowError),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("unknown fixed expense `{0}`")]
    UnknownExpense(String),
}
