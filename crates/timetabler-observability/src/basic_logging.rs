use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Builds the default filter: `LOG_LEVEL` (default `info`) for our crates, with
/// noisy dependencies held at `warn`.
pub(crate) fn default_env_filter() -> EnvFilter {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "timetabler={level},timetabler_store={level},timetabler_observability={level},tower_http=warn,hyper=warn,sqlx=warn",
            level = log_level
        ))
    })
}

/// Console-only logging, used when observability is turned off.
///
/// - **Log Level**: `LOG_LEVEL` environment variable (default: "info")
/// - **Format**: Compact, with ANSI colors and source locations
pub fn init_basic_console_logging() {
    let console_layer = fmt::layer()
        .compact()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(true)
        .with_filter(default_env_filter());

    // A subscriber may already be installed (tests, CLI re-entry).
    if tracing_subscriber::registry()
        .with(console_layer)
        .try_init()
        .is_ok()
    {
        tracing::info!(
            "Observability disabled - console logging only (OBSERVABILITY_ENABLED=false or feature not compiled)"
        );
    }
}
