#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use dronedb_exporter::collector::queries::ACTIVE_REPOS_SQL;
use dronedb_exporter::collector::DroneCollector;
use dronedb_exporter::config::{CollectorConfig, Config, DatabaseConfig, LoggingConfig};
use dronedb_exporter::metrics::{MetricSample, Metrics};
use dronedb_exporter::routes::create_router;
use dronedb_exporter::state::AppState;
use dronedb_exporter::store::{Connector, Row, StoreConnection, StoreError, Value};

#[derive(Debug, Clone)]
pub struct FixtureBuild {
    pub repo_id: i64,
    pub number: i64,
    pub status: &'static str,
    pub started: i64,
    pub finished: Option<i64>,
}

pub fn build(
    repo_id: i64,
    number: i64,
    status: &'static str,
    started: i64,
    finished: Option<i64>,
) -> FixtureBuild {
    FixtureBuild {
        repo_id,
        number,
        status,
        started,
        finished,
    }
}

#[derive(Debug, Default)]
struct Tables {
    repos: Vec<(String, i64, bool)>,
    builds: Vec<FixtureBuild>,
    refuse_connections: bool,
    fail_repo_listing: bool,
    /// (repo id, SQL fragment): matching build queries fail.
    failing: Vec<(i64, String)>,
}

/// In-memory stand-in for the drone database. It answers exactly the statements
/// the collector issues, with the same ordering and filtering semantics.
#[derive(Clone, Default)]
pub struct FixtureDb {
    tables: Arc<Mutex<Tables>>,
    pub opened: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
}

impl FixtureDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repo(self, name: &str, id: i64, active: bool) -> Self {
        self.tables
            .lock()
            .unwrap()
            .repos
            .push((name.to_string(), id, active));
        self
    }

    pub fn build(self, build: FixtureBuild) -> Self {
        self.tables.lock().unwrap().builds.push(build);
        self
    }

    pub fn refuse_connections(self) -> Self {
        self.tables.lock().unwrap().refuse_connections = true;
        self
    }

    pub fn fail_repo_listing(self) -> Self {
        self.tables.lock().unwrap().fail_repo_listing = true;
        self
    }

    pub fn fail_queries(self, repo_id: i64, sql_fragment: &str) -> Self {
        self.tables
            .lock()
            .unwrap()
            .failing
            .push((repo_id, sql_fragment.to_string()));
        self
    }

    /// Makes every later connection attempt fail.
    pub fn go_down(&self) {
        self.tables.lock().unwrap().refuse_connections = true;
    }

    pub fn add_build(&self, build: FixtureBuild) {
        self.tables.lock().unwrap().builds.push(build);
    }

    pub fn connector(&self) -> Arc<dyn Connector> {
        Arc::new(self.clone())
    }
}

#[async_trait]
impl Connector for FixtureDb {
    async fn connect(&self) -> Result<Box<dyn StoreConnection>, StoreError> {
        if self.tables.lock().unwrap().refuse_connections {
            return Err(StoreError::Connection {
                target: self.describe(),
                reason: "password authentication failed for user \"drone\"".to_string(),
            });
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FixtureConnection {
            db: self.clone(),
            open: true,
        }))
    }

    fn describe(&self) -> String {
        "fixture".to_string()
    }
}

struct FixtureConnection {
    db: FixtureDb,
    open: bool,
}

#[async_trait]
impl StoreConnection for FixtureConnection {
    async fn query_all(&mut self, sql: &str, _params: &[Value]) -> Result<Vec<Row>, StoreError> {
        if !self.open {
            return Err(StoreError::Closed);
        }
        let tables = self.db.tables.lock().unwrap();
        if sql != ACTIVE_REPOS_SQL {
            return Err(StoreError::query(sql, "unexpected statement"));
        }
        if tables.fail_repo_listing {
            return Err(StoreError::query(sql, "relation \"repos\" does not exist"));
        }
        let mut active: Vec<_> = tables.repos.iter().filter(|(_, _, a)| *a).collect();
        active.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(active
            .into_iter()
            .map(|(name, id, _)| Row::new(vec![Value::Text(name.clone()), Value::Int(*id)]))
            .collect())
    }

    async fn query_one(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> Result<Option<Row>, StoreError> {
        if !self.open {
            return Err(StoreError::Closed);
        }
        let repo_id = match params {
            [Value::Int(id)] => *id,
            _ => return Err(StoreError::query(sql, "expected a single integer parameter")),
        };
        let tables = self.db.tables.lock().unwrap();
        if tables
            .failing
            .iter()
            .any(|(id, fragment)| *id == repo_id && sql.contains(fragment.as_str()))
        {
            return Err(StoreError::query(sql, "canceling statement due to lock timeout"));
        }

        let successful_only = sql.contains("build_status = 'success'");
        let finished_only = sql.contains("build_finished IS NOT NULL");
        let last = tables
            .builds
            .iter()
            .filter(|b| b.repo_id == repo_id)
            .filter(|b| !successful_only || b.status == "success")
            .filter(|b| !finished_only || b.finished.map_or(false, |f| f > 0))
            .max_by_key(|b| b.number);

        let Some(last) = last else {
            return Ok(None);
        };
        let value = if sql.starts_with("SELECT build_number") {
            Value::Int(last.number)
        } else if sql.contains("build_finished - build_started") {
            // Running builds carry `0` and report no duration.
            match last.finished {
                Some(finished) if finished > 0 => Value::Int(finished - last.started),
                _ => Value::Null,
            }
        } else {
            return Err(StoreError::query(sql, "unexpected statement"));
        };
        Ok(Some(Row::new(vec![value])))
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        if self.open {
            self.open = false;
            self.db.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// The scenario used throughout: `app` is active with one success and one failure,
/// `lib` is inactive.
pub fn app_and_lib() -> FixtureDb {
    FixtureDb::new()
        .repo("app", 1, true)
        .repo("lib", 2, false)
        .build(build(1, 5, "success", 0, Some(10)))
        .build(build(1, 6, "failure", 20, Some(25)))
        .build(build(2, 1, "success", 0, Some(3)))
}

pub fn collector(db: &FixtureDb, include_unfinished_builds: bool) -> DroneCollector {
    DroneCollector::new(
        db.connector(),
        &CollectorConfig {
            include_unfinished_builds,
        },
    )
}

pub fn test_config() -> Config {
    Config {
        database: DatabaseConfig {
            host: "localhost".to_string(),
            port: 5432,
            name: "drone".to_string(),
            user: "drone".to_string(),
            password: "drone".to_string(),
            connect_timeout_secs: 1,
        },
        listen_address: "127.0.0.1".to_string(),
        listen_port: 9698,
        collector: CollectorConfig::default(),
        logging: LoggingConfig::default(),
    }
}

pub fn build_app(db: &FixtureDb) -> (Router, Metrics) {
    let config = Arc::new(test_config());
    let metrics = Metrics::new();
    let state = AppState::new(
        config.clone(),
        DroneCollector::new(db.connector(), &config.collector),
        metrics.clone(),
    );
    (create_router(state), metrics)
}

/// Value of the sample called `name` for `repo`, if emitted.
pub fn value_of(samples: &[MetricSample], name: &str, repo: &str) -> Option<f64> {
    samples
        .iter()
        .find(|s| s.name == name && s.label("repo") == Some(repo))
        .map(|s| s.value)
}
