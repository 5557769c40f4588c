use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use kgchat_core::state::Artifact;
use kgchat_core::tools::{Tool, ToolContext, ToolError, ToolResult};

use crate::pipeline::CompetencyPipeline;

pub const COMPETENCY_FILE_NAME: &str = "competency_questions.json";

#[derive(Debug, Deserialize)]
struct TestArgs {
    question: String,
    query: String,
    expected_answer: String,
}

/// Runs one competency-question validation on behalf of the calling agent.
pub struct TestCompetencyQuestionTool {
    pipeline: CompetencyPipeline,
}

impl TestCompetencyQuestionTool {
    pub fn new(pipeline: CompetencyPipeline) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl Tool for TestCompetencyQuestionTool {
    fn name(&self) -> &str {
        "test_competency_question"
    }

    fn description(&self) -> &str {
        "Given a competency question, a query that should be able to help answer the question, \
         and an expected answer, runs an independent test to see if the query can be used to \
         answer the question. If successful, the question, query, and expected answer are saved \
         to the set of validated competency questions. If not successful, returns information \
         for further iteration."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "required": ["question", "query", "expected_answer"],
            "properties": {
                "question": {
                    "type": "string",
                    "description": "Competency question to test."
                },
                "query": {
                    "type": "string",
                    "description": "Query that should answer the competency question."
                },
                "expected_answer": {
                    "type": "string",
                    "description": "Expected answer to the competency question."
                }
            }
        })
    }

    async fn execute(
        &self,
        args: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolResult, ToolError> {
        let args: TestArgs = ToolError::parse_args(args)?;
        let outcome = self
            .pipeline
            .run(&ctx.state, &args.question, &args.query, &args.expected_answer)
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        Ok(ToolResult::text(outcome.raw))
    }
}

/// Hands the validated set to the user as a file. The model only learns that
/// the download was offered.
pub struct DownloadCompetencyQuestionsTool;

#[async_trait]
impl Tool for DownloadCompetencyQuestionsTool {
    fn name(&self) -> &str {
        "download_competency_questions"
    }

    fn description(&self) -> &str {
        "Download the validated competency questions."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "properties": {}})
    }

    async fn execute(
        &self,
        _args: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolResult, ToolError> {
        let validated = ctx.state.validated();
        let contents = serde_json::to_string(&validated)
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        info!(agent = %ctx.agent_name, count = validated.len(), "competency questions offered for download");
        ctx.state.push_artifact(Artifact::Download {
            label: "Download competency questions".into(),
            file_name: COMPETENCY_FILE_NAME.into(),
            contents,
        });
        Ok(ToolResult::text(
            "The user has been shown the button to download the current set of competency questions.",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_ctx;
    use kgchat_core::competency::ValidatedCompetencyQuestion;
    use serde_json::json;

    #[tokio::test]
    async fn download_publishes_artifact() {
        let ctx = test_ctx();
        ctx.state.push_validated(ValidatedCompetencyQuestion {
            question: "Which genes cause cystic fibrosis?".into(),
            query: "MATCH (g:Gene)-[:causes]->(d) RETURN g.id".into(),
            expected_answer: "CFTR".into(),
        });

        let result = DownloadCompetencyQuestionsTool
            .execute(json!({}), &ctx)
            .await
            .unwrap();
        assert!(result.content.contains("has been shown the button"));

        let artifacts = ctx.state.take_artifacts();
        assert_eq!(artifacts.len(), 1);
        let Artifact::Download {
            file_name,
            contents,
            ..
        } = &artifacts[0];
        assert_eq!(file_name, "competency_questions.json");
        let parsed: serde_json::Value = serde_json::from_str(contents).unwrap();
        assert_eq!(parsed[0]["expected_answer"], "CFTR");
        assert_eq!(parsed[0]["question"], "Which genes cause cystic fibrosis?");
    }

    #[tokio::test]
    async fn download_of_empty_set() {
        let ctx = test_ctx();
        DownloadCompetencyQuestionsTool.execute(json!({}), &ctx).await.unwrap();
        let artifacts = ctx.state.take_artifacts();
        let Artifact::Download { contents, .. } = &artifacts[0];
        assert_eq!(contents, "[]");
    }
}
