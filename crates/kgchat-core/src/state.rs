use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::competency::ValidatedCompetencyQuestion;
use crate::tokens::TokenLedger;

/// Something a tool produced for the user rather than the model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    Download {
        label: String,
        file_name: String,
        contents: String,
    },
}

/// Mutable state owned by one agent instance and visible to its tools.
#[derive(Debug, Default)]
pub struct AgentState {
    pub ledger: TokenLedger,
    validated: Mutex<Vec<ValidatedCompetencyQuestion>>,
    artifacts: Mutex<Vec<Artifact>>,
}

impl AgentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_validated(&self, entry: ValidatedCompetencyQuestion) {
        self.validated.lock().push(entry);
    }

    pub fn validated(&self) -> Vec<ValidatedCompetencyQuestion> {
        self.validated.lock().clone()
    }

    pub fn replace_validated(&self, entries: Vec<ValidatedCompetencyQuestion>) {
        *self.validated.lock() = entries;
    }

    pub fn push_artifact(&self, artifact: Artifact) {
        self.artifacts.lock().push(artifact);
    }

    /// Remove and return every pending artifact.
    pub fn take_artifacts(&self) -> Vec<Artifact> {
        std::mem::take(&mut *self.artifacts.lock())
    }
}
