use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use kgchat_core::tools::{Tool, ToolContext, ToolError, ToolResult};

use crate::search::KeywordSearchClient;

#[derive(Debug, Deserialize)]
struct SearchArgs {
    search_terms: Vec<String>,
}

pub struct SearchTool {
    client: Arc<KeywordSearchClient>,
}

impl SearchTool {
    pub fn new(client: Arc<KeywordSearchClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search for nodes matching one or more terms. Each term is searched separately."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "required": ["search_terms"],
            "properties": {
                "search_terms": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Search terms to look up in the database."
                }
            }
        })
    }

    async fn execute(
        &self,
        args: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<ToolResult, ToolError> {
        let args: SearchArgs = ToolError::parse_args(args)?;
        Ok(match self.client.search(&args.search_terms).await {
            Ok(output) => ToolResult::text(output.payload),
            Err(over) => ToolResult::text(over.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::budget::ResponseBudget;
    use crate::search::SearchConfig;
    use crate::tools::test_ctx;
    use serde_json::json;
    use wiremock::matchers::query_param;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn payload_keyed_by_term() {
        let server = MockServer::start().await;
        Mock::given(query_param("q", "CARD9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"id": "HGNC:16391", "name": "CARD9", "category": "biolink:Gene"}]
            })))
            .mount(&server)
            .await;
        Mock::given(query_param("q", "nonexistent-xyz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .mount(&server)
            .await;

        let client = KeywordSearchClient::new(
            SearchConfig {
                url: server.uri(),
                page_size: 5,
                timeout: Duration::from_secs(5),
            },
            ResponseBudget::default(),
        )
        .unwrap();
        let result = SearchTool::new(Arc::new(client))
            .execute(json!({"search_terms": ["CARD9", "nonexistent-xyz"]}), &test_ctx())
            .await
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(parsed["CARD9"][0]["id"], "HGNC:16391");
        assert_eq!(parsed["nonexistent-xyz"], json!([]));
    }

    #[tokio::test]
    async fn terms_must_be_a_list() {
        let client = KeywordSearchClient::new(
            SearchConfig {
                url: "http://127.0.0.1:9".into(),
                page_size: 5,
                timeout: Duration::from_millis(100),
            },
            ResponseBudget::default(),
        )
        .unwrap();
        let err = SearchTool::new(Arc::new(client))
            .execute(json!({"search_terms": "CARD9"}), &test_ctx())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
