//! Application startup and server initialization.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::collector::DroneCollector;
use crate::config::Config;
use crate::metrics::Metrics;
use crate::routes;
use crate::state::AppState;
use crate::store::create_connector;

/// Initializes and runs the exporter.
///
/// Registers the collector behind `/metrics` and serves until the process is
/// terminated. No database connection is opened until the first scrape.
///
/// # Errors
///
/// Returns an error if the server fails to bind to the configured address
/// or encounters a runtime error during execution.
pub async fn run(config: Arc<Config>) -> Result<(), Box<dyn std::error::Error>> {
    let connector = create_connector(&config.database);
    info!("Collecting from drone database {}", connector.describe());
    let collector = DroneCollector::new(connector, &config.collector);

    let state = AppState::new(config.clone(), collector, Metrics::new());
    let app = routes::create_router(state);

    let bind_address = config.bind_address();
    let listener = TcpListener::bind(&bind_address).await?;
    info!("Starting dronedb exporter on http://{}/metrics", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
