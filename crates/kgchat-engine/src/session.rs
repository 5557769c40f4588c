//! Chat state for one user: which agent is active, how messages are shown,
//! and export/import of every agent's transcript.

use std::path::Path;

use futures::{Stream, StreamExt};
use serde_json::{Map, Value};
use tracing::info;

use kgchat_core::ids::SessionId;
use kgchat_core::messages::Message;
use kgchat_core::state::Artifact;

use crate::agent::ConversationalAgent;
use crate::catalog::{AgentCatalog, CatalogEntry};
use crate::error::{EngineError, SessionError, TranscriptError};
use crate::factory::AgentFactory;
use crate::transcript::AgentTranscript;

pub const THINKING: &str = "*Thinking...*";

/// One piece of a rendered message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    User(String),
    Assistant(String),
    ToolCall(String),
    ToolResult(String),
}

/// What the user sees for one message, plus the status line to show while
/// the next one is produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedMessage {
    pub status: String,
    pub blocks: Vec<Block>,
}

pub struct Session {
    id: SessionId,
    catalog: AgentCatalog,
    factory: AgentFactory,
    /// Parallel to `catalog.entries()`.
    agents: Vec<ConversationalAgent>,
    current: usize,
    show_tool_calls: bool,
}

impl Session {
    pub fn new(catalog: AgentCatalog, factory: AgentFactory) -> Result<Self, SessionError> {
        if catalog.entries().is_empty() {
            return Err(SessionError::EmptyCatalog);
        }
        let agents = build_agents(&catalog, &factory);
        Ok(Self {
            id: SessionId::new(),
            catalog,
            factory,
            agents,
            current: 0,
            show_tool_calls: false,
        })
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn catalog(&self) -> &AgentCatalog {
        &self.catalog
    }

    pub fn current_entry(&self) -> &CatalogEntry {
        &self.catalog.entries()[self.current]
    }

    pub fn current_agent(&self) -> &ConversationalAgent {
        &self.agents[self.current]
    }

    pub fn select(&mut self, name: &str) -> Result<(), SessionError> {
        self.current = self.index_of(name)?;
        info!(session_id = %self.id, agent = name, "agent selected");
        Ok(())
    }

    pub fn show_tool_calls(&self) -> bool {
        self.show_tool_calls
    }

    pub fn set_show_tool_calls(&mut self, show: bool) {
        self.show_tool_calls = show;
    }

    /// Greeting of the current agent, until its conversation starts.
    pub fn greeting(&self) -> Option<&str> {
        (!self.current_agent().conversation_started())
            .then(|| self.current_entry().greeting.as_str())
    }

    /// Run a round on the current agent. Every message is logged with the
    /// session and agent it belongs to.
    pub fn run_round(
        &mut self,
        text: &str,
    ) -> impl Stream<Item = Result<Message, EngineError>> + Send + '_ {
        let session_id = self.id.clone();
        let agent = self.catalog.entries()[self.current].name.clone();
        let idx = self.current;
        self.agents[idx].run_round(text).inspect(move |item| {
            if let Ok(message) = item {
                info!(
                    session_id = %session_id,
                    agent = %agent,
                    role = message.role(),
                    message = %serde_json::to_string(message).unwrap_or_default(),
                    "chat message"
                );
            }
        })
    }

    pub fn take_artifacts(&self) -> Vec<Artifact> {
        self.current_agent().take_artifacts()
    }

    /// Cost of the current agent so far, in USD.
    pub fn cost(&self) -> f64 {
        self.current_entry()
            .costs
            .cost(self.current_agent().totals())
    }

    pub fn cost_display(&self) -> String {
        format!("${:.2}", self.cost())
    }

    /// Rebuild every agent, discarding transcripts, counters and validated sets.
    pub fn clear_all(&mut self) {
        self.agents = build_agents(&self.catalog, &self.factory);
        info!(session_id = %self.id, "all agents cleared");
    }

    /// Transcripts of every agent that has started a conversation, keyed by
    /// agent name.
    pub fn export_chats(&self) -> Value {
        let chats: Map<String, Value> = self
            .catalog
            .entries()
            .iter()
            .zip(&self.agents)
            .filter(|(_, agent)| agent.conversation_started())
            .filter_map(|(entry, agent)| {
                serde_json::to_value(agent.snapshot())
                    .ok()
                    .map(|v| (entry.name.clone(), v))
            })
            .collect();
        Value::Object(chats)
    }

    /// Clear every agent, then load the given transcripts. Nothing changes if
    /// the export names an unknown agent or a transcript does not parse.
    pub fn import_chats(&mut self, chats: Value) -> Result<(), SessionError> {
        let Value::Object(chats) = chats else {
            return Err(SessionError::InvalidExport(
                "expected an object keyed by agent name".into(),
            ));
        };
        let mut parsed = Vec::with_capacity(chats.len());
        for (name, raw) in chats {
            let idx = self.index_of(&name)?;
            let transcript: AgentTranscript =
                serde_json::from_value(raw).map_err(TranscriptError::from)?;
            parsed.push((idx, transcript));
        }

        self.clear_all();
        let count = parsed.len();
        for (idx, transcript) in parsed {
            self.agents[idx].restore(transcript);
        }
        info!(session_id = %self.id, agents = count, "chats imported");
        Ok(())
    }

    pub fn export_to_file(&self, path: &Path) -> Result<(), SessionError> {
        let json = serde_json::to_string_pretty(&self.export_chats())
            .map_err(TranscriptError::from)?;
        std::fs::write(path, json).map_err(|source| TranscriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    pub fn import_from_file(&mut self, path: &Path) -> Result<(), SessionError> {
        let raw = std::fs::read_to_string(path).map_err(|source| TranscriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let chats: Value = serde_json::from_str(&raw).map_err(TranscriptError::from)?;
        self.import_chats(chats)
    }

    pub fn render(&self, message: &Message) -> RenderedMessage {
        render_message(message, self.show_tool_calls)
    }

    fn index_of(&self, name: &str) -> Result<usize, SessionError> {
        self.catalog
            .entries()
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| SessionError::UnknownAgent(name.to_string()))
    }
}

/// Render one message. Tool calls and results are only shown when
/// `show_tool_calls` is set; the status line is always updated.
pub fn render_message(message: &Message, show_tool_calls: bool) -> RenderedMessage {
    let mut status = THINKING.to_string();
    let mut blocks = Vec::new();
    match message {
        Message::User(user) => blocks.push(Block::User(user.content.clone())),
        Message::Assistant(assistant) => {
            let text = assistant.text_content();
            if !text.is_empty() {
                blocks.push(Block::Assistant(text));
            }
            for call in assistant.tool_calls() {
                status = format!("*Checking source ({})...*", call.name);
                if show_tool_calls {
                    blocks.push(Block::ToolCall(format!(
                        "{}(params = {})",
                        call.name, call.arguments
                    )));
                }
            }
        }
        Message::ToolResult(result) => {
            status = format!("*Evaluating result ({})...*", result.tool_name);
            if show_tool_calls {
                blocks.push(Block::ToolResult(result.content.clone()));
            }
        }
    }
    RenderedMessage { status, blocks }
}

fn build_agents(catalog: &AgentCatalog, factory: &AgentFactory) -> Vec<ConversationalAgent> {
    catalog
        .entries()
        .iter()
        .map(|entry| factory.build(entry.name.clone(), &entry.profile))
        .collect()
}
