//! Competency-question validation: a fresh answerer runs the query, a fresh
//! evaluator judges the exchange, and accepted questions are recorded on the
//! agent that asked.

use std::fmt;

use tracing::{debug, info, instrument};

use kgchat_core::competency::{EvaluationVerdict, ValidatedCompetencyQuestion};
use kgchat_core::messages::Message;
use kgchat_core::state::AgentState;

use crate::error::PipelineError;
use crate::factory::AgentFactory;
use crate::profiles::AgentProfile;
use crate::prompts;
use crate::tools::feedback::PROVIDE_FEEDBACK;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Drafted,
    Answering,
    Evaluating,
    Validated,
    Rejected,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Drafted => "drafted",
            Self::Answering => "answering",
            Self::Evaluating => "evaluating",
            Self::Validated => "validated",
            Self::Rejected => "rejected",
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PipelineOutcome {
    pub verdict: EvaluationVerdict,
    /// Verdict exactly as the evaluator's feedback tool reported it.
    pub raw: String,
    /// `Validated` or `Rejected`.
    pub state: PipelineState,
}

#[derive(Clone)]
pub struct CompetencyPipeline {
    factory: AgentFactory,
}

impl CompetencyPipeline {
    pub fn new(factory: AgentFactory) -> Self {
        Self { factory }
    }

    /// Test one question. Token usage of both helper agents is added to
    /// `owner` even when a round fails part way.
    #[instrument(skip_all)]
    pub async fn run(
        &self,
        owner: &AgentState,
        question: &str,
        query: &str,
        expected_answer: &str,
    ) -> Result<PipelineOutcome, PipelineError> {
        let mut state = PipelineState::Drafted;

        transition(&mut state, PipelineState::Answering);
        let mut answerer = self.factory.build("Answerer", &AgentProfile::answerer());
        let answered = answerer
            .collect_round(&prompts::answering_prompt(question, query))
            .await;
        owner.ledger.absorb(answerer.totals());
        let exchange = answered.map_err(|source| PipelineError::Round {
            stage: "answering",
            source,
        })?;

        transition(&mut state, PipelineState::Evaluating);
        let mut evaluator = self.factory.build("Evaluator", &AgentProfile::evaluator());
        let evaluated = evaluator
            .collect_round(&prompts::evaluation_prompt(question, expected_answer, &exchange))
            .await;
        owner.ledger.absorb(evaluator.totals());
        let evaluation = evaluated.map_err(|source| PipelineError::Round {
            stage: "evaluating",
            source,
        })?;

        let raw = find_verdict(&evaluation)?;
        let verdict = EvaluationVerdict::from_payload(&raw)
            .map_err(|e| PipelineError::MalformedVerdict(format!("{e}: {raw}")))?;

        if verdict.accept {
            owner.push_validated(ValidatedCompetencyQuestion {
                question: question.to_string(),
                query: query.to_string(),
                expected_answer: expected_answer.to_string(),
            });
            transition(&mut state, PipelineState::Validated);
        } else {
            transition(&mut state, PipelineState::Rejected);
        }
        info!(accept = verdict.accept, validated = owner.validated().len(), "competency question evaluated");

        Ok(PipelineOutcome {
            verdict,
            raw,
            state,
        })
    }
}

fn transition(state: &mut PipelineState, next: PipelineState) {
    debug!(from = %state, to = %next, "pipeline transition");
    *state = next;
}

/// The last result produced by the feedback tool. An error result means the
/// evaluator called it with unusable arguments.
fn find_verdict(messages: &[Message]) -> Result<String, PipelineError> {
    let result = messages
        .iter()
        .rev()
        .find_map(|m| match m {
            Message::ToolResult(r) if r.tool_name == PROVIDE_FEEDBACK => Some(r),
            _ => None,
        })
        .ok_or_else(|| {
            PipelineError::MalformedVerdict("evaluator did not call provide_feedback".into())
        })?;
    if result.is_error {
        return Err(PipelineError::MalformedVerdict(result.content.clone()));
    }
    Ok(result.content.clone())
}
