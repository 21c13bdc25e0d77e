//! Metrics exposition endpoint.

use std::time::Instant;

use crate::collector::DroneCollector;
use crate::metrics::{to_families, MetricsRecorder};
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use prometheus::proto::MetricFamily;
use tracing::{error, info};

/// Creates the metrics route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics_handler))
}

/// Runs one collection cycle and records its outcome on `recorder`.
///
/// A failed cycle yields no repository families and resets
/// `dronedb_active_repositories` to 0; the failure is visible through
/// `dronedb_up` and `dronedb_scrape_errors_total` instead.
pub async fn scrape<R: MetricsRecorder>(
    collector: &DroneCollector,
    recorder: &R,
) -> Vec<MetricFamily> {
    let started = Instant::now();
    let result = collector.collect().await;
    let elapsed = started.elapsed().as_secs_f64();

    match result {
        Ok(scrape) => {
            for failure in &scrape.failures {
                recorder.record_query_failure(failure.query.name());
            }
            recorder.set_active_repositories(scrape.records.len());
            recorder.record_scrape(true, elapsed);
            info!(
                repositories = scrape.records.len(),
                failed_queries = scrape.failures.len(),
                duration_secs = elapsed,
                "Scrape completed"
            );
            to_families(&scrape.samples())
        }
        Err(e) => {
            recorder.set_active_repositories(0);
            recorder.record_scrape(false, elapsed);
            error!(error = %e, "Scrape failed; no repository metrics reported");
            Vec::new()
        }
    }
}

/// Handler for the /metrics endpoint.
///
/// Scrapes are serialized so concurrent requests never hold more than one
/// database connection at a time.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    let _guard = state.scrape_lock.lock().await;
    let families = scrape(&state.collector, &state.metrics).await;

    match state.metrics.render(families) {
        Ok(metrics_text) => (
            StatusCode::OK,
            [("Content-Type", "text/plain; version=0.0.4; charset=utf-8")],
            metrics_text,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics").into_response()
        }
    }
}
