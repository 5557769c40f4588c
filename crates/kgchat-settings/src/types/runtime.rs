//! Agent, catalog, logging and output settings.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Agent loop limits.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentSettings {
    /// Completions allowed per user round before the round fails.
    pub max_turns: u32,
    /// Largest tool payload (estimated tokens) handed back to the model.
    pub max_response_tokens: u32,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_turns: 50,
            max_response_tokens: 10_000,
        }
    }
}

/// Inputs used to assemble the agent catalog.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogSettings {
    /// Markdown summary of the graph, embedded in the Monarch prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kg_summary_path: Option<PathBuf>,
    /// Reference competency questions (JSON array), embedded in the Monarch prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competency_questions_path: Option<PathBuf>,
    /// USD per 1K prompt tokens.
    pub prompt_cost_per_1k: f64,
    /// USD per 1K completion tokens.
    pub completion_cost_per_1k: f64,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            kg_summary_path: None,
            competency_questions_path: None,
            prompt_cost_per_1k: 0.01,
            completion_cost_per_1k: 0.03,
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default level (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
    /// Emit JSON lines instead of the compact human format.
    pub json: bool,
    /// Per-module level overrides, e.g. `{"kgchat_graph": "debug"}`.
    pub modules: BTreeMap<String, String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            modules: BTreeMap::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputSettings {
    /// Directory for downloaded artifacts and exported transcripts.
    pub dir: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
        }
    }
}
