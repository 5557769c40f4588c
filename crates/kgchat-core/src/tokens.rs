use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::messages::{AssistantContent, Message};
use crate::tools::ToolDefinition;

/// Per-completion token usage, raw from the provider.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// Accumulated totals for one agent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTotals {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl TokenTotals {
    pub fn total(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Monotonic token counters shared between an agent and the tools it runs.
///
/// Only ever incremented; `restore` is used when a transcript is reloaded into a
/// freshly built agent.
#[derive(Debug, Default)]
pub struct TokenLedger {
    prompt: AtomicU64,
    completion: AtomicU64,
}

impl TokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one completion's usage.
    pub fn record(&self, usage: &TokenUsage) {
        self.prompt
            .fetch_add(u64::from(usage.prompt_tokens), Ordering::Relaxed);
        self.completion
            .fetch_add(u64::from(usage.completion_tokens), Ordering::Relaxed);
    }

    /// Fold in the full totals of another agent (a delegated answerer or evaluator).
    pub fn absorb(&self, totals: TokenTotals) {
        self.prompt.fetch_add(totals.prompt_tokens, Ordering::Relaxed);
        self.completion
            .fetch_add(totals.completion_tokens, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TokenTotals {
        TokenTotals {
            prompt_tokens: self.prompt.load(Ordering::Relaxed),
            completion_tokens: self.completion.load(Ordering::Relaxed),
        }
    }

    pub fn restore(&self, totals: TokenTotals) {
        self.prompt.store(totals.prompt_tokens, Ordering::Relaxed);
        self.completion
            .store(totals.completion_tokens, Ordering::Relaxed);
    }
}

/// Estimate token count for text content.
/// Approximation: chars / 4.
pub fn estimate_text_tokens(text: &str) -> u32 {
    u32::try_from(text.len()).unwrap_or(u32::MAX).div_ceil(4)
}

/// Estimate tokens for a single message, including a fixed per-message overhead.
pub fn estimate_message_tokens(msg: &Message) -> u32 {
    let body = match msg {
        Message::User(user) => estimate_text_tokens(&user.content),
        Message::Assistant(assistant) => assistant
            .content
            .iter()
            .map(|content| match content {
                AssistantContent::Text { text } => estimate_text_tokens(text),
                AssistantContent::ToolCall(tc) => {
                    estimate_text_tokens(&tc.name)
                        + estimate_text_tokens(&tc.arguments.to_string())
                }
            })
            .sum(),
        Message::ToolResult(result) => estimate_text_tokens(&result.content),
    };
    4u32.saturating_add(body)
}

/// Estimate tokens for tool definitions.
pub fn estimate_tool_tokens(tools: &[ToolDefinition]) -> u32 {
    tools
        .iter()
        .map(|t| {
            estimate_text_tokens(&t.name)
                + estimate_text_tokens(&t.description)
                + estimate_text_tokens(&t.parameters_schema.to_string())
        })
        .sum()
}
