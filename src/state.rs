//! Shared application state.

use crate::collector::DroneCollector;
use crate::config::Config;
use crate::metrics::Metrics;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded at startup.
    pub config: Arc<Config>,
    /// Rebuilds repository metrics from the drone database on each scrape.
    pub collector: Arc<DroneCollector>,
    /// Exporter self-metrics.
    pub metrics: Metrics,
    /// Held for the duration of a scrape.
    pub scrape_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: Arc<Config>, collector: DroneCollector, metrics: Metrics) -> Self {
        AppState {
            config,
            collector: Arc::new(collector),
            metrics,
            scrape_lock: Arc::new(Mutex::new(())),
        }
    }
}
