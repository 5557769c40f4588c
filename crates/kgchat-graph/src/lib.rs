//! Read-only access to the property graph.
//!
//! [`GraphStore`] is the seam the query tool depends on. [`Neo4jHttpStore`]
//! talks to a Neo4j server over its HTTP transaction API; [`MemoryGraphStore`]
//! serves canned results in tests.

pub mod error;
pub mod memory;
pub mod neo4j;

use async_trait::async_trait;

pub use error::GraphError;
pub use memory::MemoryGraphStore;
pub use neo4j::{Neo4jConfig, Neo4jHttpStore};

/// One result row, keyed by column name.
pub type Record = serde_json::Map<String, serde_json::Value>;

#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Run a read query and return every record it produces, in order.
    async fn execute(&self, query: &str) -> Result<Vec<Record>, GraphError>;
}
