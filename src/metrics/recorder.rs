//! Exporter self-metrics, registered in a dedicated Prometheus registry.

use prometheus::proto::MetricFamily;
use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, Histogram,
    IntCounter, IntCounterVec, IntGauge, Registry, TextEncoder,
};
use std::sync::Arc;

/// Trait for recording the exporter's own health.
pub trait MetricsRecorder: Clone + Send + Sync + 'static {
    /// Records the outcome and duration of one scrape of the drone database.
    fn record_scrape(&self, success: bool, duration_secs: f64);

    /// Records a build query that failed and whose metric was omitted.
    fn record_query_failure(&self, query: &str);

    /// Records how many active repositories the last successful scrape saw.
    fn set_active_repositories(&self, count: usize);
}

/// Prometheus metrics collector.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    up: IntGauge,
    scrape_duration_seconds: Histogram,
    scrape_errors_total: IntCounter,
    query_failures_total: IntCounterVec,
    active_repositories: IntGauge,
}

impl Metrics {
    /// Creates a new metrics instance with a Prometheus registry.
    pub fn new() -> Self {
        let registry = Arc::new(Registry::new());

        let up = register_int_gauge_with_registry!(
            "dronedb_up",
            "Whether the last scrape of the drone database succeeded",
            registry.clone()
        )
        .expect("Failed to register dronedb_up");

        let scrape_duration_seconds = register_histogram_with_registry!(
            "dronedb_scrape_duration_seconds",
            "Duration of a drone database scrape in seconds",
            vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0],
            registry.clone()
        )
        .expect("Failed to register dronedb_scrape_duration_seconds");

        let scrape_errors_total = register_int_counter_with_registry!(
            "dronedb_scrape_errors_total",
            "Total number of scrapes that could not reach the drone database",
            registry.clone()
        )
        .expect("Failed to register dronedb_scrape_errors_total");

        let query_failures_total = register_int_counter_vec_with_registry!(
            "dronedb_query_failures_total",
            "Total number of failed build queries, by query",
            &["query"],
            registry.clone()
        )
        .expect("Failed to register dronedb_query_failures_total");

        let active_repositories = register_int_gauge_with_registry!(
            "dronedb_active_repositories",
            "Number of active repositories seen by the last successful scrape",
            registry.clone()
        )
        .expect("Failed to register dronedb_active_repositories");

        Metrics {
            registry,
            up,
            scrape_duration_seconds,
            scrape_errors_total,
            query_failures_total,
            active_repositories,
        }
    }

    /// Renders `families` followed by the exporter's own metrics in Prometheus text format.
    pub fn render(&self, mut families: Vec<MetricFamily>) -> Result<String, prometheus::Error> {
        families.extend(self.registry.gather());
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder for Metrics {
    fn record_scrape(&self, success: bool, duration_secs: f64) {
        self.up.set(i64::from(success));
        if !success {
            self.scrape_errors_total.inc();
        }
        self.scrape_duration_seconds.observe(duration_secs);
    }

    fn record_query_failure(&self, query: &str) {
        self.query_failures_total.with_label_values(&[query]).inc();
    }

    fn set_active_repositories(&self, count: usize) {
        self.active_repositories
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }
}
