use tracing_subscriber::{fmt, EnvFilter};

pub const DEFAULT_LOG_DIRECTIVE: &str = "expense_schedule=info";

/// Installs the global `tracing` subscriber, writing to stderr.
///
/// `RUST_LOG` wins over `configured`; an unparseable directive falls back
/// to [`DEFAULT_LOG_DIRECTIVE`]. A subscriber installed elsewhere is left alone.
pub fn init_tracing(configured: Option<&str>) {
    let filter = build_filter(configured);
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn build_filter(configured: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured.unwrap_or(DEFAULT_LOG_DIRECTIVE)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE))
}
