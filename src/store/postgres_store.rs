use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgConnection, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Connection, Postgres, Row as SqlxRow, TypeInfo};
use tracing::{debug, info};

use super::base::{Connector, Row, StoreConnection, StoreError, Value};
use crate::config::DatabaseConfig;

const APPLICATION_NAME: &str = "dronedb-exporter";

/// Opens one PostgreSQL connection per collection cycle. No pooling.
pub struct PostgresConnector {
    options: PgConnectOptions,
    target: String,
    connect_timeout: Duration,
}

impl PostgresConnector {
    pub fn new(config: &DatabaseConfig) -> Self {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.name)
            .username(&config.user)
            .password(&config.password)
            .application_name(APPLICATION_NAME);

        PostgresConnector {
            options,
            target: format!("{}@{}:{}/{}", config.user, config.host, config.port, config.name),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        }
    }
}

#[async_trait]
impl Connector for PostgresConnector {
    async fn connect(&self) -> Result<Box<dyn StoreConnection>, StoreError> {
        debug!("Connecting to drone database at {}", self.target);
        let conn = tokio::time::timeout(self.connect_timeout, PgConnection::connect_with(&self.options))
            .await
            .map_err(|_| StoreError::Connection {
                target: self.target.clone(),
                reason: format!("timed out after {}s", self.connect_timeout.as_secs()),
            })?
            .map_err(|e| StoreError::Connection {
                target: self.target.clone(),
                reason: e.to_string(),
            })?;

        Ok(Box::new(PostgresConnection {
            conn: Some(conn),
            target: self.target.clone(),
        }))
    }

    fn describe(&self) -> String {
        self.target.clone()
    }
}

/// A single live connection; `None` once closed.
pub struct PostgresConnection {
    conn: Option<PgConnection>,
    target: String,
}

impl PostgresConnection {
    fn close_error(&self, reason: impl std::fmt::Display) -> StoreError {
        StoreError::Connection {
            target: self.target.clone(),
            reason: format!("error while closing: {}", reason),
        }
    }
}

#[async_trait]
impl StoreConnection for PostgresConnection {
    async fn query_all(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, StoreError> {
        let conn = self.conn.as_mut().ok_or(StoreError::Closed)?;
        let rows = bind_params(sqlx::query(sql), params)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| StoreError::query(sql, e))?;
        rows.iter().map(decode_row).collect()
    }

    async fn query_one(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> Result<Option<Row>, StoreError> {
        let conn = self.conn.as_mut().ok_or(StoreError::Closed)?;
        let row = bind_params(sqlx::query(sql), params)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| StoreError::query(sql, e))?;
        row.as_ref().map(decode_row).transpose()
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        match self.conn.take() {
            Some(conn) => conn.close().await.map_err(|e| self.close_error(e)),
            None => Ok(()),
        }
    }
}

impl Drop for PostgresConnection {
    fn drop(&mut self) {
        if self.conn.is_some() {
            info!("Dropping drone database connection without an explicit close");
        }
    }
}

fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [Value],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            Value::Null => query.bind(None::<i64>),
            Value::Bool(v) => query.bind(*v),
            Value::Int(v) => query.bind(*v),
            Value::Float(v) => query.bind(*v),
            Value::Text(v) => query.bind(v.as_str()),
        };
    }
    query
}

/// Converts a driver row into a `Row`. Integers of any width become `Value::Int`.
fn decode_row(row: &PgRow) -> Result<Row, StoreError> {
    let mut values = Vec::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        let decoded = match column.type_info().name() {
            "INT2" => row
                .try_get::<Option<i16>, _>(idx)
                .map(|v| v.map_or(Value::Null, |v| Value::Int(v.into()))),
            "INT4" => row
                .try_get::<Option<i32>, _>(idx)
                .map(|v| v.map_or(Value::Null, |v| Value::Int(v.into()))),
            "INT8" => row
                .try_get::<Option<i64>, _>(idx)
                .map(|v| v.map_or(Value::Null, Value::Int)),
            "FLOAT4" => row
                .try_get::<Option<f32>, _>(idx)
                .map(|v| v.map_or(Value::Null, |v| Value::Float(v.into()))),
            "FLOAT8" => row
                .try_get::<Option<f64>, _>(idx)
                .map(|v| v.map_or(Value::Null, Value::Float)),
            "BOOL" => row
                .try_get::<Option<bool>, _>(idx)
                .map(|v| v.map_or(Value::Null, Value::Bool)),
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => row
                .try_get::<Option<String>, _>(idx)
                .map(|v| v.map_or(Value::Null, Value::Text)),
            other => {
                return Err(StoreError::decode(
                    column.name(),
                    format!("unsupported column type {}", other),
                ))
            }
        };
        values.push(decoded.map_err(|e| StoreError::decode(column.name(), e))?);
    }
    Ok(Row::new(values))
}
