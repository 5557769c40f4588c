use async_trait::async_trait;

use kgchat_core::competency::EvaluationVerdict;
use kgchat_core::tools::{Tool, ToolContext, ToolError, ToolResult};

/// Structured verdict channel for the evaluator. The result text is the
/// verdict payload itself so the pipeline can read it back.
pub struct ProvideFeedbackTool;

pub const PROVIDE_FEEDBACK: &str = "provide_feedback";

#[async_trait]
impl Tool for ProvideFeedbackTool {
    fn name(&self) -> &str {
        PROVIDE_FEEDBACK
    }

    fn description(&self) -> &str {
        "Provide feedback to the user."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "required": ["feedback", "accept"],
            "properties": {
                "feedback": {
                    "type": "string",
                    "description": "Feedback to provide to the user."
                },
                "accept": {
                    "type": "boolean",
                    "description": "Whether or not the answer is accepted."
                }
            }
        })
    }

    async fn execute(
        &self,
        args: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<ToolResult, ToolError> {
        let verdict: EvaluationVerdict = ToolError::parse_args(args)?;
        Ok(ToolResult::text(verdict.to_payload()))
    }
}
