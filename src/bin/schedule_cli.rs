use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use expense_schedule::{
    config::{Config, ConfigManager},
    engine::{
        next_occurrence_on_or_after, AccountLookup, Clock, FixedClock, FixedExpenseStore,
        ScheduleProvider, SystemClock, DEFAULT_SEARCH_HORIZON_MONTHS,
    },
    domain::{MonthRef, NamedEntity},
    errors::AppError,
    report::{render_schedule, render_upcoming, UpcomingLine},
    storage::JsonScheduleStore,
};

#[derive(Parser)]
#[command(version, long_version = expense_schedule::build_info(), about)]
struct Cli {
    /// Path to the schedule snapshot (overrides the configured data file)
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Treat this date as today (YYYY-MM-DD)
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the schedule for a month (defaults to the current month)
    Schedule {
        /// Month as YYYY-MM
        month: Option<String>,

        /// Print the schedule as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the next due date of each enabled fixed expense
    Next {
        /// Only show expenses whose name contains this text
        filter: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "schedule_cli failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<String, AppError> {
    let config = load_config(cli.config)?;
    expense_schedule::init_with_filter(config.log_filter.as_deref());

    let data_file = cli.data.unwrap_or_else(|| config.resolve_data_file());
    tracing::debug!(path = %data_file.display(), "opening schedule snapshot");
    let store = JsonScheduleStore::open(data_file)?;

    let clock: Box<dyn Clock> = match cli.today {
        Some(day) => Box::new(FixedClock(day)),
        None => Box::new(SystemClock),
    };

    match cli.command {
        Commands::Schedule { month, json } => {
            let provider = ScheduleProvider::new(&store, &store, &store);
            let schedule = match month {
                Some(text) => provider.monthly_schedule(text.parse::<MonthRef>()?)?,
                None => provider.current_schedule(clock.as_ref())?,
            };
            if json {
                Ok(format!("{}\n", serde_json::to_string_pretty(&schedule)?))
            } else {
                Ok(render_schedule(
                    &schedule,
                    clock.today(),
                    config.due_soon_days,
                ))
            }
        }
        Commands::Next { filter } => {
            let today = clock.today();
            let mut lines = Vec::new();
            for expense in store.enabled_expenses()? {
                if let Some(needle) = filter.as_deref() {
                    if !expense.name().to_lowercase().contains(&needle.to_lowercase()) {
                        continue;
                    }
                }
                let currency = match expense.funding().account() {
                    Some(account_id) => store.account(account_id)?.map(|account| account.currency),
                    None => expense.funding().currency().cloned(),
                };
                lines.push(UpcomingLine {
                    expense_name: expense.name().to_string(),
                    currency,
                    occurrence: next_occurrence_on_or_after(
                        &expense,
                        today,
                        DEFAULT_SEARCH_HORIZON_MONTHS,
                    ),
                });
            }
            if lines.is_empty() {
                if let Some(needle) = filter {
                    return Err(AppError::UnknownExpense(needle));
                }
            }
            lines.sort_by(|a, b| {
                let key = |line: &UpcomingLine| line.occurrence.map(|o| o.reference_date);
                // Expenses with no upcoming date sort last.
                match (key(a), key(b)) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                }
                .then_with(|| a.expense_name.cmp(&b.expense_name))
            });
            Ok(render_upcoming(&lines, DEFAULT_SEARCH_HORIZON_MONTHS))
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<Config, AppError> {
    let manager = match path {
        Some(path) => ConfigManager::new(path),
        None => ConfigManager::default_location()?,
    };
    Ok(manager.load()?)
}
