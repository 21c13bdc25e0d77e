use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::postgres_store::PostgresConnector;
use crate::config::DatabaseConfig;

/// Errors raised by the store layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    /// The database was unreachable or rejected the credentials.
    #[error("could not connect to {target}: {reason}")]
    Connection { target: String, reason: String },
    /// A single statement failed to execute.
    #[error("query failed ({sql}): {reason}")]
    Query { sql: String, reason: String },
    /// A column could not be converted into a `Value`, or had the wrong shape.
    #[error("cannot decode column {column}: {reason}")]
    Decode { column: String, reason: String },
    #[error("connection is already closed")]
    Closed,
}

impl StoreError {
    pub fn query(sql: &str, reason: impl ToString) -> Self {
        StoreError::Query {
            sql: sql.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn decode(column: impl ToString, reason: impl ToString) -> Self {
        StoreError::Decode {
            column: column.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// A single database cell, also used for positional query parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// One result row, columns in select order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row(Vec<Value>);

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Row(values)
    }

    fn column(&self, idx: usize) -> Result<&Value, StoreError> {
        self.0
            .get(idx)
            .ok_or_else(|| StoreError::decode(idx, format!("row has {} columns", self.0.len())))
    }

    /// Integer cell; `None` for SQL NULL.
    pub fn get_i64(&self, idx: usize) -> Result<Option<i64>, StoreError> {
        match self.column(idx)? {
            Value::Null => Ok(None),
            Value::Int(v) => Ok(Some(*v)),
            other => Err(StoreError::decode(idx, format!("expected integer, got {:?}", other))),
        }
    }

    /// Numeric cell widened to `f64`; `None` for SQL NULL.
    pub fn get_f64(&self, idx: usize) -> Result<Option<f64>, StoreError> {
        match self.column(idx)? {
            Value::Null => Ok(None),
            Value::Int(v) => Ok(Some(*v as f64)),
            Value::Float(v) => Ok(Some(*v)),
            other => Err(StoreError::decode(idx, format!("expected number, got {:?}", other))),
        }
    }

    pub fn get_str(&self, idx: usize) -> Result<Option<&str>, StoreError> {
        match self.column(idx)? {
            Value::Null => Ok(None),
            Value::Text(v) => Ok(Some(v.as_str())),
            other => Err(StoreError::decode(idx, format!("expected text, got {:?}", other))),
        }
    }
}

/// Opens a fresh connection to the CI database for each collection cycle.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn StoreConnection>, StoreError>;

    /// Human readable description of the target, used in logs.
    fn describe(&self) -> String;
}

/// A live, read-only connection. Parameters bind positionally to `$1`, `$2`, ...
#[async_trait]
pub trait StoreConnection: Send {
    async fn query_all(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, StoreError>;
    async fn query_one(&mut self, sql: &str, params: &[Value])
        -> Result<Option<Row>, StoreError>;
    /// Releases the connection. Calling it again is a no-op.
    async fn close(&mut self) -> Result<(), StoreError>;
}

/// Builds the connector for the configured database.
pub fn create_connector(config: &DatabaseConfig) -> Arc<dyn Connector> {
    Arc::new(PostgresConnector::new(config))
}
