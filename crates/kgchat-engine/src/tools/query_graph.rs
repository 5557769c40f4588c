use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use kgchat_core::tools::{Tool, ToolContext, ToolError, ToolResult};

use crate::query::{QueryError, QueryExecutor};

#[derive(Debug, Deserialize)]
struct QueryArgs {
    query: String,
}

pub struct QueryGraphTool {
    executor: Arc<QueryExecutor>,
}

impl QueryGraphTool {
    pub fn new(executor: Arc<QueryExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl Tool for QueryGraphTool {
    fn name(&self) -> &str {
        "query_kg"
    }

    fn description(&self) -> &str {
        "Run a cypher query against the database."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "required": ["query"],
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Cypher query to run."
                }
            }
        })
    }

    async fn execute(
        &self,
        args: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<ToolResult, ToolError> {
        let args: QueryArgs = ToolError::parse_args(args)?;
        match self.executor.execute(&args.query).await {
            Ok(output) => Ok(ToolResult::text(output.payload)),
            // Oversize is reported as a normal result so the model retries smaller.
            Err(QueryError::OverBudget(over)) => Ok(ToolResult::text(over.to_string())),
            Err(QueryError::Graph(e)) => Err(ToolError::ExecutionFailed(e.to_string())),
        }
    }
}
