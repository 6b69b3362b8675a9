use std::path::{Path, PathBuf};

use assert_cmd::Command;
use chrono::NaiveDate;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::{tempdir, TempDir};
use uuid::Uuid;

use expense_schedule::{
    engine::ExpenseService,
    domain::{
        AccountRef, AmountMode, CurrencyCode, FixedExpense, ReconciliationRecord,
        ReconciliationState, RecurrenceRange,
    },
    storage::JsonScheduleStore,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

struct Fixture {
    dir: TempDir,
    data: PathBuf,
}

impl Fixture {
    fn config(&self) -> PathBuf {
        self.dir.path().join("config.json")
    }

    fn cli(&self) -> Command {
        let mut cmd = Command::cargo_bin("schedule_cli").unwrap();
        cmd.arg("--data")
            .arg(&self.data)
            .arg("--config")
            .arg(self.config())
            .env_remove("RUST_LOG");
        cmd
    }
}

fn seeded_store() -> Fixture {
    let dir = tempdir().unwrap();
    let data = dir.path().join("schedule.json");
    seed(&data);
    Fixture { dir, data }
}

fn seed(path: &Path) {
    let store = JsonScheduleStore::open(path.to_path_buf()).unwrap();
    let card = AccountRef::new("Card", CurrencyCode::new("USD"));
    let card_id = card.id;
    store.add_account(card).unwrap();

    let rent = FixedExpense::new(
        "Rent",
        Uuid::new_v4(),
        None,
        Some(CurrencyCode::new("USD")),
        RecurrenceRange::monthly(AmountMode::Fixed { amount: 1200.0 }, 1, date(2025, 1, 1))
            .unwrap(),
    )
    .unwrap();
    let gym = FixedExpense::new(
        "Gym",
        Uuid::new_v4(),
        Some(card_id),
        None,
        RecurrenceRange::monthly(AmountMode::Fixed { amount: 30.0 }, 31, date(2025, 1, 1))
            .unwrap(),
    )
    .unwrap();
    let rent_id = ExpenseService::create(&store, rent).unwrap();
    ExpenseService::create(&store, gym).unwrap();
    store
        .record(ReconciliationRecord::new(
            rent_id,
            date(2025, 2, 1),
            ReconciliationState::Paid,
        ))
        .unwrap();
}

#[test]
fn schedule_prints_entries_and_totals() {
    let fixture = seeded_store();

    fixture
        .cli()
        .args(["--today", "2025-02-10", "schedule", "2025-02"])
        .assert()
        .success()
        .stdout(contains("Schedule for 2025-02"))
        .stdout(contains("2025-02-01  Rent"))
        .stdout(contains("2025-02-28  Gym"))
        .stdout(contains("USD 1230.00 (outstanding 30.00)"))
        .stdout(contains("Entries: 1 outstanding, 1 paid, 0 manually paid, 0 ignored"));
}

#[test]
fn schedule_defaults_to_current_month() {
    let fixture = seeded_store();

    fixture
        .cli()
        .args(["--today", "2025-04-15", "schedule"])
        .assert()
        .success()
        .stdout(contains("Schedule for 2025-04"))
        .stdout(contains("2025-04-30  Gym"));
}

#[test]
fn schedule_emits_json_on_request() {
    let fixture = seeded_store();

    let output = fixture
        .cli()
        .args(["schedule", "2025-03", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["entries"].as_array().unwrap().len(), 2);
    assert_eq!(json["totals"]["outstanding"], 2);
}

#[test]
fn invalid_month_exits_with_failure() {
    let fixture = seeded_store();

    fixture
        .cli()
        .args(["schedule", "2025-13"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("invalid calendar month"));
}

#[test]
fn missing_data_file_yields_empty_schedule() {
    let dir = tempdir().unwrap();
    let fixture = Fixture {
        data: dir.path().join("absent.json"),
        dir,
    };

    fixture
        .cli()
        .args(["schedule", "2025-01"])
        .assert()
        .success()
        .stdout(contains("No entries."));
}

#[test]
fn data_file_can_come_from_config() {
    let fixture = seeded_store();
    std::fs::write(
        fixture.config(),
        serde_json::json!({ "due_soon_days": 3, "data_file": fixture.data.display().to_string() })
            .to_string(),
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("schedule_cli").unwrap();
    cmd.arg("--config")
        .arg(fixture.config())
        .args(["schedule", "2025-02"])
        .assert()
        .success()
        .stdout(contains("Rent"));
}

#[test]
fn next_lists_upcoming_due_dates() {
    let fixture = seeded_store();

    fixture
        .cli()
        .args(["--today", "2025-02-02", "next"])
        .assert()
        .success()
        .stdout(contains("Gym").and(contains("2025-02-28  30.00 USD")))
        .stdout(contains("2025-03-01  1200.00 USD"));
}

#[test]
fn next_with_unknown_filter_fails() {
    let fixture = seeded_store();

    fixture
        .cli()
        .args(["next", "electricity"])
        .assert()
        .failure()
        .stderr(contains("unknown fixed expense"));
}
