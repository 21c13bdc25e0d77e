use std::collections::BTreeMap;

use super::queries::BuildQuery;
use crate::metrics::{MetricKind, MetricSample};
use crate::store::{Row, StoreError};

pub const LAST_SUCCESSFUL_BUILD_TIME: &str = "dronedb_repo_last_successful_build_time";
pub const LAST_BUILD_TIME: &str = "dronedb_repo_last_build_time";
pub const LAST_SUCCESSFUL_BUILD_ID: &str = "dronedb_repo_last_successful_build_id";
pub const LAST_BUILD_ID: &str = "dronedb_repo_last_build_id";

/// What one scrape learned about a single active repository.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RepoRecord {
    pub id: i64,
    pub last_successful_build_id: Option<i64>,
    pub last_build_id: Option<i64>,
    /// Seconds.
    pub last_successful_build_time: Option<f64>,
    /// Seconds.
    pub last_build_time: Option<f64>,
}

/// Collected records keyed by repository name.
pub type RepoRecords = BTreeMap<String, RepoRecord>;

impl RepoRecord {
    pub fn new(id: i64) -> Self {
        RepoRecord {
            id,
            ..Default::default()
        }
    }

    /// Stores the first column of `row` in the field `query` populates.
    /// A NULL cell leaves the field unset.
    pub fn apply(&mut self, query: BuildQuery, row: &Row) -> Result<(), StoreError> {
        match query {
            BuildQuery::LastSuccessfulBuildId => self.last_successful_build_id = row.get_i64(0)?,
            BuildQuery::LastBuildId => self.last_build_id = row.get_i64(0)?,
            BuildQuery::LastSuccessfulBuildTime => {
                self.last_successful_build_time = row.get_f64(0)?
            }
            BuildQuery::LastBuildTime => self.last_build_time = row.get_f64(0)?,
        }
        Ok(())
    }

    /// One sample per populated field, labelled with the repository name.
    pub fn samples(&self, repo: &str) -> Vec<MetricSample> {
        let fields = [
            (
                LAST_SUCCESSFUL_BUILD_TIME,
                "Last successful build time in seconds",
                MetricKind::Gauge,
                self.last_successful_build_time,
            ),
            (
                LAST_BUILD_TIME,
                "Last build time in seconds",
                MetricKind::Gauge,
                self.last_build_time,
            ),
            (
                LAST_SUCCESSFUL_BUILD_ID,
                "Last successful build id",
                MetricKind::Counter,
                self.last_successful_build_id.map(|id| id as f64),
            ),
            (
                LAST_BUILD_ID,
                "Last build id",
                MetricKind::Counter,
                self.last_build_id.map(|id| id as f64),
            ),
        ];

        fields
            .into_iter()
            .filter_map(|(name, help, kind, value)| {
                value.map(|v| MetricSample::new(name, help, kind, vec![("repo", repo.to_string())], v))
            })
            .collect()
    }
}
