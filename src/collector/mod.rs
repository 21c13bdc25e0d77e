//! Turns the Drone CI database into per-repository metric samples.

mod drone_collector;
pub mod queries;
pub mod record;

pub use drone_collector::{CollectError, DroneCollector, QueryFailure, Scrape};
pub use queries::BuildQuery;
pub use record::{RepoRecord, RepoRecords};
