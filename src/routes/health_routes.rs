//! Liveness and landing page.

use crate::state::AppState;
use axum::{
    body::Body,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};

const INDEX_PAGE: &str = "<html><head><title>DroneDB Exporter</title></head>\
<body><h1>DroneDB Exporter</h1><p><a href=\"/metrics\">Metrics</a></p></body></html>";

/// Registers health check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
}

/// Returns 200 while the process is up. Does not touch the database.
async fn health_check() -> impl IntoResponse {
    Response::new(Body::from("OK"))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}
