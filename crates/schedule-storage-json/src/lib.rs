//! schedule-storage-json
//!
//! File-backed JSON snapshot store for fixed expenses, reconciliation records,
//! and account metadata. Implements every schedule-core collaborator contract.

use std::{
    cmp::Reverse,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use schedule_core::{
    AccountLookup, CoreError, ExpenseRepository, FixedExpenseStore, MemoryStore,
    ReconciliationStore, Snapshot,
};
use schedule_domain::{AccountRef, DateWindow, FixedExpense, Identifiable, ReconciliationRecord};

const BACKUP_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

/// JSON snapshot persisted to a single file, with rolling backups of prior versions.
///
/// Reads are served from memory; every successful mutation rewrites the file.
pub struct JsonScheduleStore {
    path: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
    memory: MemoryStore,
}

impl JsonScheduleStore {
    /// Opens the snapshot at `path`, starting empty if the file does not exist yet.
    pub fn open(path: PathBuf) -> Result<Self, CoreError> {
        let backups_dir = path
            .parent()
            .map(|parent| parent.join("backups"))
            .unwrap_or_else(|| PathBuf::from("backups"));
        Self::with_retention(path, backups_dir, DEFAULT_RETENTION)
    }

    pub fn with_retention(
        path: PathBuf,
        backups_dir: PathBuf,
        retention: usize,
    ) -> Result<Self, CoreError> {
        let snapshot = if path.exists() {
            load_snapshot_from_path(&path)?
        } else {
            Snapshot::default()
        };
        for warning in snapshot.warnings() {
            warn!(path = %path.display(), "{warning}");
        }
        Ok(Self {
            path,
            backups_dir,
            retention: retention.max(1),
            memory: MemoryStore::from_snapshot(snapshot),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> Result<Snapshot, CoreError> {
        self.memory.snapshot()
    }

    pub fn add_account(&self, account: AccountRef) -> Result<(), CoreError> {
        self.commit(|memory| memory.add_account(account), |_| true)
    }

    /// Stores a reconciliation outcome and advances the expense watermark.
    pub fn record(&self, record: ReconciliationRecord) -> Result<(), CoreError> {
        self.commit(|memory| memory.record(record), |_| true)
    }

    pub fn revert(&self, expense_id: Uuid, reference_date: NaiveDate) -> Result<bool, CoreError> {
        self.commit(
            |memory| memory.revert(expense_id, reference_date),
            |removed| *removed,
        )
    }

    /// Backups of earlier snapshot versions, newest first.
    pub fn list_backups(&self) -> Result<Vec<PathBuf>, CoreError> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some(BACKUP_EXTENSION) {
                entries.push(path);
            }
        }
        entries.sort_by_key(|path| Reverse(parse_backup_timestamp(path)));
        Ok(entries)
    }

    /// Applies `apply` to the in-memory snapshot and persists the result when
    /// `changed` says so. A failed write restores the previous snapshot, so
    /// memory never holds state that is not on disk.
    fn commit<T>(
        &self,
        apply: impl FnOnce(&MemoryStore) -> Result<T, CoreError>,
        changed: impl FnOnce(&T) -> bool,
    ) -> Result<T, CoreError> {
        let previous = self.memory.snapshot()?;
        let value = apply(&self.memory)?;
        if !changed(&value) {
            return Ok(value);
        }
        if let Err(err) = self.flush() {
            warn!(path = %self.path.display(), error = %err, "rolling back unsaved change");
            self.memory.replace(previous)?;
            return Err(err);
        }
        Ok(value)
    }

    fn flush(&self) -> Result<(), CoreError> {
        let snapshot = self.memory.snapshot()?;
        self.backup_existing_file()?;
        save_snapshot_to_path(&snapshot, &self.path)?;
        debug!(
            path = %self.path.display(),
            expenses = snapshot.expenses.len(),
            reconciliations = snapshot.reconciliations.len(),
            "saved schedule snapshot"
        );
        Ok(())
    }

    fn backup_existing_file(&self) -> Result<(), CoreError> {
        if !self.path.exists() {
            return Ok(());
        }
        fs::create_dir_all(&self.backups_dir)?;
        let stem = self
            .path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("schedule");
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT);
        let backup_path = self
            .backups_dir
            .join(format!("{stem}_{timestamp}.{BACKUP_EXTENSION}"));
        fs::copy(&self.path, backup_path)?;
        self.prune_backups()
    }

    fn prune_backups(&self) -> Result<(), CoreError> {
        for path in self.list_backups()?.into_iter().skip(self.retention) {
            let _ = fs::remove_file(path);
        }
        Ok(())
    }
}

impl FixedExpenseStore for JsonScheduleStore {
    fn enabled_expenses(&self) -> Result<Vec<FixedExpense>, CoreError> {
        self.memory.enabled_expenses()
    }
}

impl ExpenseRepository for JsonScheduleStore {
    fn get(&self, id: Uuid) -> Result<Option<FixedExpense>, CoreError> {
        self.memory.get(id)
    }

    fn insert(&self, expense: FixedExpense) -> Result<(), CoreError> {
        self.commit(|memory| memory.insert(expense), |_| true)
    }

    fn save(&self, expense: &FixedExpense, expected_version: u64) -> Result<(), CoreError> {
        self.commit(|memory| memory.save(expense, expected_version), |_| true)
    }

    fn remove(&self, id: Uuid) -> Result<bool, CoreError> {
        self.commit(|memory| memory.remove(id), |removed| *removed)
    }
}

impl ReconciliationStore for JsonScheduleStore {
    fn records_in_window(&self, window: &DateWindow) -> Result<Vec<ReconciliationRecord>, CoreError> {
        self.memory.records_in_window(window)
    }

    fn records_for_expense(&self, expense_id: Uuid) -> Result<Vec<ReconciliationRecord>, CoreError> {
        self.memory.records_for_expense(expense_id)
    }
}

impl AccountLookup for JsonScheduleStore {
    fn account(&self, account_id: Uuid) -> Result<Option<AccountRef>, CoreError> {
        self.memory.account(account_id)
    }
}

/// Saves a snapshot to an arbitrary path on disk.
pub fn save_snapshot_to_path(snapshot: &Snapshot, path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json =
        serde_json::to_string_pretty(snapshot).map_err(|err| CoreError::Serde(err.to_string()))?;
    let tmp = tmp_path(path);
    write_atomic(&tmp, &json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Loads a snapshot and re-checks every expense's invariants.
pub fn load_snapshot_from_path(path: &Path) -> Result<Snapshot, CoreError> {
    let data = fs::read_to_string(path)?;
    let snapshot: Snapshot =
        serde_json::from_str(&data).map_err(|err| CoreError::Serde(err.to_string()))?;
    for expense in &snapshot.expenses {
        expense.validate().map_err(|err| {
            CoreError::Storage(format!(
                "expense {} in {} is invalid: {err}",
                expense.id(),
                path.display()
            ))
        })?;
    }
    Ok(snapshot)
}

fn parse_backup_timestamp(path: &Path) -> Option<DateTime<Utc>> {
    let stem = path.file_stem()?.to_str()?;
    let mut segments = stem.rsplitn(3, '_');
    let time = segments.next()?;
    let date = segments.next()?;
    if !is_digits(date, 8) || !is_digits(time, 6) {
        return None;
    }
    NaiveDateTime::parse_from_str(&format!("{date}{time}"), "%Y%m%d%H%M%S")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
