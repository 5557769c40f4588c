use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kgchat_core::competency::ValidatedCompetencyQuestion;
use kgchat_core::messages::Message;
use kgchat_core::tokens::TokenTotals;

use crate::error::TranscriptError;

/// Saved conversation state of one agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentTranscript {
    pub agent: String,
    pub messages: Vec<Message>,
    #[serde(default)]
    pub tokens: TokenTotals,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validated: Vec<ValidatedCompetencyQuestion>,
    pub saved_at: DateTime<Utc>,
}

impl AgentTranscript {
    /// Write the transcript as pretty JSON, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<(), TranscriptError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| TranscriptError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, TranscriptError> {
        let raw = std::fs::read_to_string(path).map_err(|source| TranscriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }
}
