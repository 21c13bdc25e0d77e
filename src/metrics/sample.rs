//! Metric samples and their conversion into Prometheus metric families.

use prometheus::proto::{Counter, Gauge, LabelPair, Metric, MetricFamily, MetricType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    Counter,
}

/// A single labeled value ready for exposition.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
    pub labels: Vec<(&'static str, String)>,
    pub value: f64,
}

impl MetricSample {
    pub fn new(
        name: &'static str,
        help: &'static str,
        kind: MetricKind,
        labels: Vec<(&'static str, String)>,
        value: f64,
    ) -> Self {
        MetricSample {
            name,
            help,
            kind,
            labels,
            value,
        }
    }

    /// Returns the value of the label called `name`, if any.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(label, _)| *label == name)
            .map(|(_, value)| value.as_str())
    }

    fn to_metric(&self) -> Metric {
        let mut metric = Metric::default();
        for (name, value) in &self.labels {
            let mut pair = LabelPair::default();
            pair.set_name(name.to_string());
            pair.set_value(value.clone());
            metric.mut_label().push(pair);
        }
        match self.kind {
            MetricKind::Gauge => {
                let mut gauge = Gauge::default();
                gauge.set_value(self.value);
                metric.set_gauge(gauge);
            }
            MetricKind::Counter => {
                let mut counter = Counter::default();
                counter.set_value(self.value);
                metric.set_counter(counter);
            }
        }
        metric
    }
}

/// Groups samples into one family per metric name, keeping first-seen order.
pub fn to_families(samples: &[MetricSample]) -> Vec<MetricFamily> {
    let mut families: Vec<MetricFamily> = Vec::new();
    for sample in samples {
        let idx = match families.iter().position(|f| f.get_name() == sample.name) {
            Some(idx) => idx,
            None => {
                let mut family = MetricFamily::default();
                family.set_name(sample.name.to_string());
                family.set_help(sample.help.to_string());
                family.set_field_type(match sample.kind {
                    MetricKind::Gauge => MetricType::GAUGE,
                    MetricKind::Counter => MetricType::COUNTER,
                });
                families.push(family);
                families.len() - 1
            }
        };
        families[idx].mut_metric().push(sample.to_metric());
    }
    families
}
