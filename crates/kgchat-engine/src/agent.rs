use std::panic::AssertUnwindSafe;
use std::pin::pin;
use std::sync::Arc;
use std::time::Instant;

use async_stream::stream;
use futures::{FutureExt, Stream, StreamExt};
use tracing::{debug, error, info, instrument, warn};

use kgchat_core::context::LlmContext;
use kgchat_core::ids::AgentId;
use kgchat_core::messages::{AssistantMessage, Message, ToolCallBlock};
use kgchat_core::provider::{LlmProvider, StreamOptions};
use kgchat_core::state::{AgentState, Artifact};
use kgchat_core::stream::collect_message;
use kgchat_core::tokens::TokenTotals;
use kgchat_core::tools::ToolContext;

use crate::error::EngineError;
use crate::profiles::AgentProfile;
use crate::registry::ToolRegistry;
use crate::transcript::AgentTranscript;

/// Prefix some models put in front of tool names.
const TOOL_NAME_ARTIFACT: &str = "functions.";

#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Completions allowed in a single round before it fails.
    pub max_turns: u32,
    pub stream_options: StreamOptions,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_turns: 50,
            stream_options: StreamOptions::default(),
        }
    }
}

/// A system prompt and a tool set bound to a completion engine, with the
/// transcript it has accumulated so far.
pub struct ConversationalAgent {
    id: AgentId,
    name: String,
    role: &'static str,
    system_prompt: String,
    tools: ToolRegistry,
    provider: Arc<dyn LlmProvider>,
    config: AgentConfig,
    messages: Vec<Message>,
    state: Arc<AgentState>,
}

impl ConversationalAgent {
    pub fn new(
        name: impl Into<String>,
        profile: &AgentProfile,
        tools: ToolRegistry,
        provider: Arc<dyn LlmProvider>,
        config: AgentConfig,
    ) -> Self {
        Self {
            id: AgentId::new(),
            name: name.into(),
            role: profile.role,
            system_prompt: profile.system_prompt.clone(),
            tools,
            provider,
            config,
            messages: Vec::new(),
            state: Arc::new(AgentState::new()),
        }
    }

    pub fn id(&self) -> &AgentId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> &'static str {
        self.role
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.names()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn state(&self) -> &Arc<AgentState> {
        &self.state
    }

    pub fn totals(&self) -> TokenTotals {
        self.state.ledger.snapshot()
    }

    pub fn conversation_started(&self) -> bool {
        !self.messages.is_empty()
    }

    /// Artifacts produced for the user since the last call.
    pub fn take_artifacts(&self) -> Vec<Artifact> {
        self.state.take_artifacts()
    }

    /// Estimated prompt size of the next completion request.
    pub fn estimate_context_tokens(&self) -> u32 {
        self.context().estimate_tokens()
    }

    /// Run one user turn. The returned stream yields every assistant and
    /// tool-result message as it is appended to the transcript, and ends
    /// after an assistant message without tool calls.
    ///
    /// Nothing happens until the stream is polled. Dropping it part way
    /// leaves the transcript with whatever was appended so far.
    pub fn run_round(
        &mut self,
        text: &str,
    ) -> impl Stream<Item = Result<Message, EngineError>> + Send + '_ {
        let text = text.to_string();
        stream! {
            info!(agent = %self.name, role = self.role, "round started");
            self.messages.push(Message::user_text(text));

            let mut turns = 0u32;
            loop {
                if turns >= self.config.max_turns {
                    warn!(agent = %self.name, max_turns = self.config.max_turns, "round hit turn limit");
                    yield Err(EngineError::MaxTurnsExceeded(self.config.max_turns));
                    return;
                }
                turns += 1;

                let assistant = match self.complete(turns).await {
                    Ok(message) => message,
                    Err(e) => {
                        error!(agent = %self.name, error = %e, "completion failed");
                        yield Err(e);
                        return;
                    }
                };
                let calls: Vec<ToolCallBlock> =
                    assistant.tool_calls().into_iter().cloned().collect();
                let message = Message::Assistant(assistant);
                self.messages.push(message.clone());
                yield Ok(message);

                if calls.is_empty() {
                    break;
                }
                for call in &calls {
                    let result = self.dispatch(call).await;
                    self.messages.push(result.clone());
                    yield Ok(result);
                }
            }
            debug!(agent = %self.name, turns, "round complete");
        }
    }

    /// Run a round to completion and return its messages.
    pub async fn collect_round(&mut self, text: &str) -> Result<Vec<Message>, EngineError> {
        let mut round = pin!(self.run_round(text));
        let mut messages = Vec::new();
        while let Some(message) = round.next().await {
            messages.push(message?);
        }
        Ok(messages)
    }

    pub fn snapshot(&self) -> AgentTranscript {
        AgentTranscript {
            agent: self.name.clone(),
            messages: self.messages.clone(),
            tokens: self.totals(),
            validated: self.state.validated(),
            saved_at: chrono::Utc::now(),
        }
    }

    /// Replace this agent's conversation state with a saved transcript.
    pub fn restore(&mut self, transcript: AgentTranscript) {
        self.messages = transcript.messages;
        self.state.ledger.restore(transcript.tokens);
        self.state.replace_validated(transcript.validated);
    }

    fn context(&self) -> LlmContext {
        LlmContext {
            system_prompt: self.system_prompt.clone(),
            messages: self.messages.clone(),
            tools: self.tools.definitions(),
        }
    }

    #[instrument(skip(self), fields(agent = %self.name))]
    async fn complete(&self, turn: u32) -> Result<AssistantMessage, EngineError> {
        let context = self.context();
        let events = self
            .provider
            .stream(&context, &self.config.stream_options)
            .await?;
        let mut message = collect_message(events).await?;
        if let Some(usage) = &message.usage {
            self.state.ledger.record(usage);
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "completion usage recorded"
            );
        }
        repair_tool_names(&mut message);
        Ok(message)
    }

    #[instrument(skip(self, call), fields(agent = %self.name, tool = %call.name))]
    async fn dispatch(&self, call: &ToolCallBlock) -> Message {
        let Some(tool) = self.tools.get(&call.name) else {
            warn!("model requested an unknown tool");
            return Message::tool_result(
                call.id.clone(),
                call.name.clone(),
                format!("[error] Unknown tool: {}", call.name),
                true,
            );
        };

        let ctx = ToolContext {
            agent_id: self.id.clone(),
            agent_name: self.name.clone(),
            tool_call_id: call.id.clone(),
            state: Arc::clone(&self.state),
        };

        let start = Instant::now();
        let result = AssertUnwindSafe(tool.execute(call.arguments.clone(), &ctx))
            .catch_unwind()
            .await;

        let (content, is_error) = match result {
            Ok(Ok(r)) => (r.content, r.is_error),
            Ok(Err(e)) => (e.to_string(), true),
            Err(panic) => {
                let msg = panic_message(&panic);
                error!(panic = %msg, "tool panicked during execution");
                ("Internal error: tool crashed".into(), true)
            }
        };
        debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            is_error,
            "tool finished"
        );

        Message::tool_result(
            call.id.clone(),
            call.name.clone(),
            if is_error {
                format!("[error] {content}")
            } else {
                content
            },
            is_error,
        )
    }
}

fn repair_tool_names(message: &mut AssistantMessage) {
    for call in message.tool_calls_mut() {
        if let Some(stripped) = call.name.strip_prefix(TOOL_NAME_ARTIFACT) {
            debug!(original = %call.name, "stripped tool name prefix");
            call.name = stripped.to_string();
        }
    }
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    panic
        .downcast_ref::<String>()
        .map(|s| s.as_str())
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic")
        .to_string()
}
