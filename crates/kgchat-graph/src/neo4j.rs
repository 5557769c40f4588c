use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::{GraphError, GraphStore, Record};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct Neo4jConfig {
    /// Base URL of the HTTP API, e.g. `http://localhost:7474`.
    pub url: String,
    pub database: String,
    pub user: Option<String>,
    pub password: Option<SecretString>,
    pub timeout: Duration,
}

/// Neo4j client over the HTTP transaction API. Every query runs in its own
/// auto-committed transaction routed as a read.
pub struct Neo4jHttpStore {
    client: Client,
    endpoint: String,
    user: Option<String>,
    password: Option<SecretString>,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<ServerError>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<RowData>,
}

#[derive(Debug, Deserialize)]
struct RowData {
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ServerError {
    code: String,
    message: String,
}

impl Neo4jHttpStore {
    pub fn new(config: Neo4jConfig) -> Result<Self, GraphError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| GraphError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/db/{}/tx/commit",
                config.url.trim_end_matches('/'),
                config.database
            ),
            user: config.user,
            password: config.password,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GraphStore for Neo4jHttpStore {
    #[instrument(skip(self, query), fields(query_len = query.len()))]
    async fn execute(&self, query: &str) -> Result<Vec<Record>, GraphError> {
        let body = json!({
            "statements": [{"statement": query, "resultDataContents": ["row"]}]
        });

        let mut req = self
            .client
            .post(&self.endpoint)
            .header("access-mode", "READ")
            .json(&body);
        if let Some(user) = &self.user {
            req = req.basic_auth(user, self.password.as_ref().map(|p| p.expose_secret()));
        }

        let resp = req
            .send()
            .await
            .map_err(|e| GraphError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GraphError::Status { status, body });
        }

        let decoded: CommitResponse = resp
            .json()
            .await
            .map_err(|e| GraphError::Decode(e.to_string()))?;
        let records = into_records(decoded)?;
        debug!(records = records.len(), "graph query complete");
        Ok(records)
    }
}

fn into_records(response: CommitResponse) -> Result<Vec<Record>, GraphError> {
    if let Some(err) = response.errors.into_iter().next() {
        return Err(GraphError::Query {
            code: err.code,
            message: err.message,
        });
    }

    let Some(result) = response.results.into_iter().next() else {
        return Ok(Vec::new());
    };

    result
        .data
        .into_iter()
        .map(|data| {
            if data.row.len() != result.columns.len() {
                return Err(GraphError::Decode(format!(
                    "row has {} values for {} columns",
                    data.row.len(),
                    result.columns.len()
                )));
            }
            Ok(result.columns.iter().cloned().zip(data.row).collect())
        })
        .collect()
}
