//! Timetabler Observability
//!
//! Provides:
//! - Console and rolling JSON file logging
//! - Prometheus metrics, including timetable and leave counters
//! - HTTP request/response logging
//!
//! Compiled in via the `observability` feature (default). At runtime,
//! `OBSERVABILITY_ENABLED=false` drops back to console logging and disables metrics.
//!
//! # Examples
//!
//! ```no_run
//! use timetabler_observability::{init_metrics, init_tracing};
//!
//! #[tokio::main]
//! async fn main() {
//!     init_tracing();
//!     let _handle = init_metrics();
//!     // ... application code ...
//! }
//! ```

pub mod basic_logging;

#[cfg(feature = "observability")]
pub mod logging;
#[cfg(feature = "observability")]
pub mod metrics;

#[cfg(feature = "observability")]
pub use metrics_exporter_prometheus::PrometheusHandle;

#[cfg(feature = "observability")]
pub use logging::{init_tracing, logging_middleware};
#[cfg(feature = "observability")]
pub use metrics::{
    init_metrics, metrics_app, metrics_middleware, track_leave_applied, track_leave_reviewed,
    track_slot_added, track_slot_conflict, track_slot_removed, track_subjects_fallback,
};

/// Reads `OBSERVABILITY_ENABLED` once; anything but `false`/`0` counts as enabled.
pub fn is_observability_enabled() -> bool {
    use std::sync::OnceLock;

    static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();
    *OBSERVABILITY_ENABLED.get_or_init(|| {
        std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true)
    })
}

// No-op stubs when observability is disabled
#[cfg(not(feature = "observability"))]
pub mod stubs {
    use axum::{Router, extract::Request, middleware::Next, response::Response};

    pub fn init_tracing() {
        crate::basic_logging::init_basic_console_logging();
    }

    pub async fn logging_middleware(req: Request, next: Next) -> Response {
        next.run(req).await
    }

    pub async fn metrics_middleware(req: Request, next: Next) -> Response {
        next.run(req).await
    }

    pub fn init_metrics() -> Option<()> {
        None
    }

    pub fn metrics_app(_handle: ()) -> Router {
        Router::new()
    }

    pub fn track_slot_added(_year: &str) {}
    pub fn track_slot_conflict(_year: &str) {}
    pub fn track_slot_removed(_year: &str) {}
    pub fn track_leave_applied(_role: &str) {}
    pub fn track_leave_reviewed(_status: &str) {}
    pub fn track_subjects_fallback(_reason: &str) {}
}

#[cfg(not(feature = "observability"))]
pub use stubs::*;
