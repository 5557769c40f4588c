use std::sync::Arc;

use tracing::{debug, instrument, warn};

use kgchat_graph::{GraphError, GraphStore, Record};

use crate::budget::{BudgetExceeded, BudgetSubject, ResponseBudget};

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    OverBudget(#[from] BudgetExceeded),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Records of one query together with the serialized form handed to the model.
#[derive(Clone, Debug)]
pub struct QueryOutput {
    pub records: Vec<Record>,
    pub payload: String,
    pub tokens: u32,
}

/// Runs read queries against the graph and keeps oversized results away from
/// the model.
pub struct QueryExecutor {
    store: Arc<dyn GraphStore>,
    budget: ResponseBudget,
}

impl QueryExecutor {
    pub fn new(store: Arc<dyn GraphStore>, budget: ResponseBudget) -> Self {
        Self { store, budget }
    }

    pub fn budget(&self) -> ResponseBudget {
        self.budget
    }

    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn execute(&self, query: &str) -> Result<QueryOutput, QueryError> {
        let records = self.store.execute(query).await.inspect_err(|e| {
            warn!(kind = e.error_kind(), error = %e, "graph query failed");
        })?;
        let payload = serde_json::Value::Array(
            records
                .iter()
                .cloned()
                .map(serde_json::Value::Object)
                .collect(),
        )
        .to_string();
        let tokens = self.budget.check(&payload, BudgetSubject::Query)?;
        debug!(records = records.len(), tokens, "query result within budget");
        Ok(QueryOutput {
            records,
            payload,
            tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgchat_graph::MemoryGraphStore;
    use serde_json::json;

    const GENES: &str = "MATCH (g:Gene) RETURN g.id AS id LIMIT 2";

    fn executor(store: MemoryGraphStore, limit: u32) -> QueryExecutor {
        QueryExecutor::new(Arc::new(store), ResponseBudget::new(limit))
    }

    #[tokio::test]
    async fn serializes_records() {
        let store = MemoryGraphStore::new()
            .with_json(GENES, json!([{"id": "HGNC:1"}, {"id": "HGNC:2"}]));
        let out = executor(store, 10_000).execute(GENES).await.unwrap();
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.payload, r#"[{"id":"HGNC:1"},{"id":"HGNC:2"}]"#);
        assert!(out.tokens > 4);
    }

    #[tokio::test]
    async fn empty_result_is_empty_array() {
        let out = executor(MemoryGraphStore::new(), 10_000)
            .execute("MATCH (n:Nothing) RETURN n")
            .await
            .unwrap();
        assert_eq!(out.payload, "[]");
    }

    #[tokio::test]
    async fn oversized_result_reports_true_count() {
        let rows: Vec<_> = (0..200).map(|i| json!({"name": format!("node-{i:04}")})).collect();
        let store = MemoryGraphStore::new().with_json("MATCH (n) RETURN n.name AS name", json!(rows));
        let err = executor(store, 100)
            .execute("MATCH (n) RETURN n.name AS name")
            .await
            .unwrap_err();
        match err {
            QueryError::OverBudget(over) => {
                assert!(over.tokens > 100);
                assert_eq!(over.limit, 100);
                assert!(over.to_string().ends_with("Please try a smaller query."));
            }
            other => panic!("expected OverBudget, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn database_failure_propagates() {
        let store = MemoryGraphStore::new().with_failure(
            "MATC (n)",
            "Neo.ClientError.Statement.SyntaxError",
            "Invalid input",
        );
        let executor = executor(store, 10_000);
        let err = executor.execute("MATC (n)").await.unwrap_err();
        assert!(matches!(err, QueryError::Graph(GraphError::Query { .. })));
        assert!(err.to_string().starts_with("Neo.ClientError.Statement.SyntaxError"));
    }
}
