use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream;
use parking_lot::Mutex;

use kgchat_core::context::LlmContext;
use kgchat_core::errors::GatewayError;
use kgchat_core::ids::ToolCallId;
use kgchat_core::messages::{AssistantContent, AssistantMessage, StopReason, ToolCallBlock};
use kgchat_core::provider::{EventStream, LlmProvider, StreamOptions};
use kgchat_core::stream::StreamEvent;
use kgchat_core::tokens::TokenUsage;

use crate::converter::message_events;

/// Pre-programmed responses for deterministic testing without API calls.
pub enum MockResponse {
    /// Yield a sequence of StreamEvents.
    Stream(Vec<StreamEvent>),
    /// Return an error from the stream() call itself.
    Error(GatewayError),
    /// Wait a duration, then yield the inner response.
    Delay(Duration, Box<MockResponse>),
}

impl MockResponse {
    /// A complete assistant message.
    pub fn message(message: AssistantMessage) -> Self {
        Self::Stream(message_events(message))
    }

    /// Plain text reply that ends the round.
    pub fn text(text: &str, usage: TokenUsage) -> Self {
        let mut message = AssistantMessage::text(text);
        message.usage = Some(usage);
        Self::message(message)
    }

    /// A single tool call.
    pub fn tool_call(name: &str, arguments: serde_json::Value, usage: TokenUsage) -> Self {
        Self::tool_calls(vec![(name, arguments)], usage)
    }

    /// Several tool calls in one assistant message, executed in order.
    pub fn tool_calls(calls: Vec<(&str, serde_json::Value)>, usage: TokenUsage) -> Self {
        let content = calls
            .into_iter()
            .map(|(name, arguments)| {
                AssistantContent::ToolCall(ToolCallBlock {
                    id: ToolCallId::new(),
                    name: name.to_string(),
                    arguments,
                })
            })
            .collect();
        Self::message(AssistantMessage {
            content,
            usage: Some(usage),
            stop_reason: Some(StopReason::ToolUse),
        })
    }

    /// Convenience: create a stream that ends with an error event.
    pub fn stream_error(error: GatewayError) -> Self {
        Self::Stream(vec![StreamEvent::Start, StreamEvent::Error { error }])
    }

    /// Convenience: wrap any response with a delay.
    pub fn delayed(delay: Duration, inner: MockResponse) -> Self {
        Self::Delay(delay, Box::new(inner))
    }
}

/// Shorthand for usage figures in tests.
pub fn usage(prompt_tokens: u32, completion_tokens: u32) -> TokenUsage {
    TokenUsage {
        prompt_tokens,
        completion_tokens,
    }
}

/// Mock provider that returns pre-programmed responses in sequence and keeps
/// every context it was asked to complete.
pub struct MockProvider {
    responses: Mutex<VecDeque<MockResponse>>,
    contexts: Mutex<Vec<LlmContext>>,
    call_count: AtomicUsize,
}

impl MockProvider {
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            contexts: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Contexts received so far, in call order.
    pub fn contexts(&self) -> Vec<LlmContext> {
        self.contexts.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().len()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    fn context_window(&self) -> usize {
        128_000
    }

    fn supports_tools(&self) -> bool {
        true
    }

    async fn stream(
        &self,
        context: &LlmContext,
        _options: &StreamOptions,
    ) -> Result<EventStream, GatewayError> {
        let idx = self.call_count.fetch_add(1, Ordering::Relaxed);
        self.contexts.lock().push(context.clone());

        let next = self.responses.lock().pop_front();
        let Some(response) = next else {
            return Err(GatewayError::InvalidRequest(format!(
                "MockProvider: no response configured for call {idx}"
            )));
        };

        resolve_response(response).await
    }
}

/// Resolve a MockResponse, handling Delay by sleeping first.
async fn resolve_response(response: MockResponse) -> Result<EventStream, GatewayError> {
    let mut current = response;
    loop {
        match current {
            MockResponse::Stream(events) => return Ok(Box::pin(stream::iter(events))),
            MockResponse::Error(e) => return Err(e),
            MockResponse::Delay(duration, inner) => {
                tokio::time::sleep(duration).await;
                current = *inner;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use kgchat_core::messages::Message;
    use kgchat_core::stream::collect_message;

    #[tokio::test]
    async fn text_response() {
        let mock = MockProvider::new(vec![MockResponse::text("hello world", usage(10, 2))]);
        let mut stream = mock
            .stream(&LlmContext::empty(), &StreamOptions::default())
            .await
            .unwrap();

        let mut events = Vec::new();
        while let Some(event) = stream.next().await {
            events.push(event);
        }

        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], StreamEvent::Start));
        assert!(matches!(&events[1], StreamEvent::TextDelta { delta } if delta == "hello world"));
        match &events[2] {
            StreamEvent::Done { message, .. } => {
                assert_eq!(message.usage, Some(usage(10, 2)));
            }
            other => panic!("expected Done, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn tool_call_response() {
        let mock = MockProvider::new(vec![MockResponse::tool_calls(
            vec![
                ("query_kg", serde_json::json!({"query": "RETURN 1"})),
                ("search", serde_json::json!({"terms": ["x"]})),
            ],
            usage(5, 5),
        )]);
        let stream = mock
            .stream(&LlmContext::empty(), &StreamOptions::default())
            .await
            .unwrap();
        let msg = collect_message(stream).await.unwrap();
        assert_eq!(msg.tool_calls().len(), 2);
        assert_eq!(msg.stop_reason, Some(StopReason::ToolUse));
    }

    #[tokio::test]
    async fn error_and_exhaustion() {
        let mock = MockProvider::new(vec![MockResponse::Error(
            GatewayError::AuthenticationFailed("bad".into()),
        )]);
        let ctx = LlmContext::empty();
        assert!(mock.stream(&ctx, &StreamOptions::default()).await.is_err());
        let err = mock
            .stream(&ctx, &StreamOptions::default())
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("no response configured for call 1"));
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn records_contexts() {
        let mock = MockProvider::new(vec![
            MockResponse::text("a", usage(1, 1)),
            MockResponse::text("b", usage(1, 1)),
        ]);
        let mut ctx = LlmContext::empty();
        ctx.messages.push(Message::user_text("first"));
        let _ = mock.stream(&ctx, &StreamOptions::default()).await.unwrap();
        ctx.messages.push(Message::user_text("second"));
        let _ = mock.stream(&ctx, &StreamOptions::default()).await.unwrap();

        let seen = mock.contexts();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].messages.len(), 1);
        assert_eq!(seen[1].messages.len(), 2);
        assert_eq!(mock.remaining(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_error() {
        let mock = MockProvider::new(vec![MockResponse::delayed(
            Duration::from_millis(20),
            MockResponse::Error(GatewayError::RateLimited { retry_after: None }),
        )]);
        let result = mock
            .stream(&LlmContext::empty(), &StreamOptions::default())
            .await;
        match result {
            Err(GatewayError::RateLimited { .. }) => {}
            Err(other) => panic!("expected RateLimited, got: {other:?}"),
            Ok(_) => panic!("expected error"),
        }
    }

    #[test]
    fn provider_properties() {
        let mock = MockProvider::new(vec![]);
        assert_eq!(mock.name(), "mock");
        assert_eq!(mock.model(), "mock-model");
        assert!(mock.supports_tools());
    }
}
