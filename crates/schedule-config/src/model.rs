use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DATA_DIR_NAME: &str = "expense-schedule";
const DATA_FILE_NAME: &str = "schedule.json";

/// Stores user-configurable preferences for schedule queries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Days ahead of today that an outstanding entry counts as due soon.
    #[serde(default = "Config::default_due_soon_days")]
    pub due_soon_days: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional snapshot file. Defaults to `<data dir>/expense-schedule/schedule.json`.
    pub data_file: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// `tracing` filter directive, e.g. `expense_schedule=debug`.
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            due_soon_days: Self::default_due_soon_days(),
            data_file: None,
            log_filter: None,
        }
    }
}

impl Config {
    pub fn default_due_soon_days() -> i64 {
        7
    }

    pub fn resolve_data_file(&self) -> PathBuf {
        if let Some(path) = &self.data_file {
            return path.clone();
        }

        let base = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        base.join(DATA_DIR_NAME).join(DATA_FILE_NAME)
    }
}
