use crate::messages::Message;
use crate::tokens::{estimate_message_tokens, estimate_text_tokens, estimate_tool_tokens};
use crate::tools::ToolDefinition;

/// The complete context sent to a provider for one completion.
#[derive(Clone, Debug, Default)]
pub struct LlmContext {
    pub system_prompt: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
}

impl LlmContext {
    /// Create an empty context (useful for testing).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Estimated size of this request, using the same estimator as tool budgets.
    pub fn estimate_tokens(&self) -> u32 {
        let messages: u32 = self.messages.iter().map(estimate_message_tokens).sum();
        estimate_text_tokens(&self.system_prompt) + messages + estimate_tool_tokens(&self.tools)
    }
}
