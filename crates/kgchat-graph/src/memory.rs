use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{GraphError, GraphStore, Record};

enum Canned {
    Records(Vec<Record>),
    Failure { code: String, message: String },
}

/// In-memory store answering from canned results keyed by exact query text.
/// Unknown queries return no records. Every executed query is recorded.
#[derive(Default)]
pub struct MemoryGraphStore {
    canned: Mutex<HashMap<String, Canned>>,
    executed: Mutex<Vec<String>>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(self, query: &str, records: Vec<Record>) -> Self {
        self.canned
            .lock()
            .insert(query.to_string(), Canned::Records(records));
        self
    }

    /// Build records from a JSON array of objects. Non-object entries are skipped.
    pub fn with_json(self, query: &str, rows: serde_json::Value) -> Self {
        let records = match rows {
            serde_json::Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    serde_json::Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        self.with_records(query, records)
    }

    pub fn with_failure(self, query: &str, code: &str, message: &str) -> Self {
        self.canned.lock().insert(
            query.to_string(),
            Canned::Failure {
                code: code.to_string(),
                message: message.to_string(),
            },
        );
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().clone()
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn execute(&self, query: &str) -> Result<Vec<Record>, GraphError> {
        self.executed.lock().push(query.to_string());
        match self.canned.lock().get(query) {
            Some(Canned::Records(records)) => Ok(records.clone()),
            Some(Canned::Failure { code, message }) => Err(GraphError::Query {
                code: code.clone(),
                message: message.clone(),
            }),
            None => Ok(Vec::new()),
        }
    }
}
