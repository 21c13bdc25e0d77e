pub mod base;
pub mod postgres_store;

// Re-export the primary store items so code outside can do
// "use crate::store::{Connector, create_connector};"
pub use base::{create_connector, Connector, Row, StoreConnection, StoreError, Value};
