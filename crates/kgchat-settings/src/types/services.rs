//! Connection settings for the external services: completion engine, graph
//! database and keyword search.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// OpenAI-compatible chat completions endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmSettings {
    /// API base URL, without the `/chat/completions` suffix.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// API key. Usually supplied through `OPENAI_API_KEY`.
    #[serde(skip_serializing)]
    pub api_key: Option<SecretString>,
    /// Completion token cap per request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Retry policy for transient failures.
    pub retry: RetrySettings,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4-1106-preview".to_string(),
            api_key: None,
            max_tokens: None,
            temperature: None,
            request_timeout_ms: 120_000,
            retry: RetrySettings::default(),
        }
    }
}

/// Retry configuration for completion requests.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrySettings {
    /// Maximum number of retry attempts.
    pub max_retries: u32,
    /// Base delay between retries in milliseconds.
    pub base_delay_ms: u64,
    /// Maximum delay between retries in milliseconds.
    pub max_delay_ms: u64,
    /// Jitter factor (0.0–1.0) applied to retry delays.
    pub jitter_factor: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            jitter_factor: 0.2,
        }
    }
}

/// Neo4j HTTP transaction endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphSettings {
    /// Base URL of the HTTP API, e.g. `http://localhost:7474`.
    pub url: String,
    /// Database name.
    pub database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<SecretString>,
    /// Per-query timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:7474".to_string(),
            database: "neo4j".to_string(),
            user: None,
            password: None,
            timeout_ms: 60_000,
        }
    }
}

/// Keyword search API.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchSettings {
    pub url: String,
    /// Hits requested per term.
    pub page_size: u32,
    pub timeout_ms: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            url: "https://api-v3.monarchinitiative.org/v3/api/search".to_string(),
            page_size: 5,
            timeout_ms: 30_000,
        }
    }
}
