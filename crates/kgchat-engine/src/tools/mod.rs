pub mod competency;
pub mod feedback;
pub mod query_graph;
pub mod search;

use std::fmt;

use serde::{Deserialize, Serialize};

/// The tools an agent profile can enable. Each kind maps to one
/// registered tool name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    QueryKg,
    Search,
    TestCompetencyQuestion,
    DownloadCompetencyQuestions,
    ProvideFeedback,
}

impl ToolKind {
    pub fn tool_name(self) -> &'static str {
        match self {
            Self::QueryKg => "query_kg",
            Self::Search => "search",
            Self::TestCompetencyQuestion => "test_competency_question",
            Self::DownloadCompetencyQuestions => "download_competency_questions",
            Self::ProvideFeedback => feedback::PROVIDE_FEEDBACK,
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tool_name())
    }
}

#[cfg(test)]
pub(crate) fn test_ctx() -> kgchat_core::tools::ToolContext {
    use kgchat_core::ids::{AgentId, ToolCallId};
    use kgchat_core::state::AgentState;

    kgchat_core::tools::ToolContext {
        agent_id: AgentId::new(),
        agent_name: "test".into(),
        tool_call_id: ToolCallId::new(),
        state: std::sync::Arc::new(AgentState::new()),
    }
}
