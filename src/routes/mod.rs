//! HTTP route definitions and handlers.

mod health_routes;
mod metrics_routes;

pub use metrics_routes::scrape;

use crate::state::AppState;
use axum::Router;

/// Creates the application router with the metrics and health routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(metrics_routes::routes())
        .merge(health_routes::routes())
        .with_state(state)
}
