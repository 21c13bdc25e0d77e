//! Library exports for dronedb-exporter, shared between the binary and tests.

pub mod cli;
pub mod collector;
pub mod config;
pub mod metrics;
pub mod routes;
pub mod startup;
pub mod state;
pub mod store;
pub mod utils;
