use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::{Duration, Instant};
use tracing::warn;

use crate::is_observability_enabled;

const HTTP_DURATION_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

/// Installs the Prometheus recorder and spawns its upkeep task.
/// Returns None if observability is disabled or a recorder is already installed.
pub fn init_metrics() -> Option<PrometheusHandle> {
    if !is_observability_enabled() {
        return None;
    }

    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            HTTP_DURATION_BUCKETS,
        )
        .map_err(|e| warn!(error = %e, "Invalid histogram buckets"))
        .ok()?;

    let handle = builder
        .install_recorder()
        .map_err(|e| warn!(error = %e, "Failed to install Prometheus recorder"))
        .ok()?;

    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Some(handle)
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    gauge!("http_requests_active").increment(1.0);

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!("http_requests_total", "method" => method.clone(), "path" => path.clone(), "status" => status).increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "path" => path).record(latency);

    gauge!("http_requests_active").decrement(1.0);

    response
}

/// Serves the Prometheus scrape endpoint.
pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

// Business metrics helpers

pub fn track_slot_added(year: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("timetable_slots_added_total", "year" => year.to_string()).increment(1);
}

/// A slot was refused because its teacher is already booked.
pub fn track_slot_conflict(year: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("timetable_slot_conflicts_total", "year" => year.to_string()).increment(1);
}

pub fn track_slot_removed(year: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("timetable_slots_removed_total", "year" => year.to_string()).increment(1);
}

pub fn track_leave_applied(role: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("leaves_applied_total", "role" => role.to_string()).increment(1);
}

pub fn track_leave_reviewed(status: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("leaves_reviewed_total", "status" => status.to_string()).increment(1);
}

pub fn track_subjects_fallback(reason: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("subjects_fallback_total", "reason" => reason.to_string()).increment(1);
}
