use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, warn};

use super::queries::{BuildQuery, ACTIVE_REPOS_SQL};
use super::record::{RepoRecord, RepoRecords};
use crate::config::CollectorConfig;
use crate::metrics::MetricSample;
use crate::store::{Connector, StoreConnection, StoreError, Value};
use crate::utils::log_throttle::LogThrottle;

const QUERY_FAILURE_LOG_INTERVAL: Duration = Duration::from_secs(300);

/// Failures that abort a whole scrape.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CollectError {
    #[error("cannot open the drone database: {0}")]
    Connect(StoreError),
    #[error("cannot list active repositories: {0}")]
    Repositories(StoreError),
}

/// A build query that failed; its metric is omitted for that repository.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryFailure {
    pub repo: String,
    pub query: BuildQuery,
    pub error: StoreError,
}

/// Result of one successful collection cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scrape {
    pub records: RepoRecords,
    pub failures: Vec<QueryFailure>,
}

impl Scrape {
    /// Samples for every repository, in repository-name order.
    pub fn samples(&self) -> Vec<MetricSample> {
        self.records
            .iter()
            .flat_map(|(name, record)| record.samples(name))
            .collect()
    }
}

/// Rebuilds the per-repository records from the drone database on every call.
pub struct DroneCollector {
    connector: Arc<dyn Connector>,
    build_queries: Vec<(BuildQuery, String)>,
    throttle: LogThrottle,
}

impl DroneCollector {
    pub fn new(connector: Arc<dyn Connector>, config: &CollectorConfig) -> Self {
        let build_queries = BuildQuery::ALL
            .into_iter()
            .map(|query| (query, query.sql(config.include_unfinished_builds)))
            .collect();

        DroneCollector {
            connector,
            build_queries,
            throttle: LogThrottle::new(QUERY_FAILURE_LOG_INTERVAL),
        }
    }

    /// Opens a fresh connection, runs every query and closes the connection again.
    pub async fn collect(&self) -> Result<Scrape, CollectError> {
        let mut conn = self.connector.connect().await.map_err(|e| {
            error!(target_db = %self.connector.describe(), error = %e, "Connection to drone database failed");
            CollectError::Connect(e)
        })?;

        let result = self.collect_with(conn.as_mut()).await;

        if let Err(e) = conn.close().await {
            warn!(error = %e, "Failed to close drone database connection");
        }
        result
    }

    async fn collect_with(&self, conn: &mut dyn StoreConnection) -> Result<Scrape, CollectError> {
        let mut scrape = Scrape {
            records: collect_repos(conn).await?,
            failures: Vec::new(),
        };

        for (repo, record) in scrape.records.iter_mut() {
            for (query, sql) in &self.build_queries {
                if let Err(e) = run_build_query(conn, *query, sql, record).await {
                    self.log_query_failure(repo, *query, &e);
                    scrape.failures.push(QueryFailure {
                        repo: repo.clone(),
                        query: *query,
                        error: e,
                    });
                }
            }
        }

        debug!(
            repositories = scrape.records.len(),
            failures = scrape.failures.len(),
            "Collected drone database records"
        );
        Ok(scrape)
    }

    fn log_query_failure(&self, repo: &str, query: BuildQuery, e: &StoreError) {
        let key = format!("{}.{}", repo, query.name());
        if let Some(suppressed) = self.throttle.should_emit(&key) {
            warn!(
                repo = %repo,
                query = query.name(),
                suppressed,
                error = %e,
                "Build query failed; omitting metric"
            );
        }
    }
}

async fn collect_repos(conn: &mut dyn StoreConnection) -> Result<RepoRecords, CollectError> {
    let rows = conn
        .query_all(ACTIVE_REPOS_SQL, &[])
        .await
        .map_err(CollectError::Repositories)?;

    let mut records = RepoRecords::new();
    for row in rows {
        let name = row.get_str(0).map_err(CollectError::Repositories)?;
        let id = row.get_i64(1).map_err(CollectError::Repositories)?;
        match (name, id) {
            (Some(name), Some(id)) => {
                records.insert(name.to_string(), RepoRecord::new(id));
            }
            _ => debug!("Skipping repository row with a NULL name or id"),
        }
    }
    Ok(records)
}

async fn run_build_query(
    conn: &mut dyn StoreConnection,
    query: BuildQuery,
    sql: &str,
    record: &mut RepoRecord,
) -> Result<(), StoreError> {
    match conn.query_one(sql, &[Value::Int(record.id)]).await? {
        Some(row) => record.apply(query, &row),
        None => Ok(()),
    }
}
