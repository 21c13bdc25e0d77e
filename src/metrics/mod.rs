//! Metrics collection and exposition for Prometheus.
//!
//! `sample` turns collected repository data into metric families, `recorder` holds
//! the exporter's own health metrics and renders both in the text format.

mod recorder;
mod sample;

pub use recorder::{Metrics, MetricsRecorder};
pub use sample::{to_families, MetricKind, MetricSample};
