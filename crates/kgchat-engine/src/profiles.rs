use crate::prompts;
use crate::tools::ToolKind;

/// What distinguishes one agent variant from another: its instructions and
/// the tools it may call. Shared capabilities come from the factory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentProfile {
    /// Short role label used in logs.
    pub role: &'static str,
    pub system_prompt: String,
    pub tools: Vec<ToolKind>,
}

impl AgentProfile {
    /// Domain assistant: graph queries plus keyword search.
    pub fn monarch(system_prompt: String) -> Self {
        Self {
            role: "monarch",
            system_prompt,
            tools: vec![ToolKind::QueryKg, ToolKind::Search],
        }
    }

    /// Graph explorer that drives the competency-question pipeline.
    pub fn explorer() -> Self {
        Self {
            role: "explorer",
            system_prompt: prompts::EXPLORER_PROMPT.to_string(),
            tools: vec![
                ToolKind::QueryKg,
                ToolKind::TestCompetencyQuestion,
                ToolKind::DownloadCompetencyQuestions,
            ],
        }
    }

    pub fn answerer() -> Self {
        Self {
            role: "answerer",
            system_prompt: prompts::ANSWERER_PROMPT.to_string(),
            tools: vec![ToolKind::QueryKg],
        }
    }

    pub fn evaluator() -> Self {
        Self {
            role: "evaluator",
            system_prompt: prompts::EVALUATOR_PROMPT.to_string(),
            tools: vec![ToolKind::QueryKg, ToolKind::ProvideFeedback],
        }
    }
}
