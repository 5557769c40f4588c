use futures::StreamExt;

use crate::errors::GatewayError;
use crate::messages::{AssistantMessage, StopReason, ToolCallBlock};
use crate::provider::EventStream;

/// Events emitted during one completion. Ordering contract:
///
/// Start → (TextDelta | ToolCall)* → Done
///
/// Error can appear at any point and ends the stream.
#[derive(Clone, Debug)]
pub enum StreamEvent {
    Start,
    TextDelta { delta: String },
    ToolCall { tool_call: ToolCallBlock },
    Done {
        message: AssistantMessage,
        stop_reason: StopReason,
    },
    Error { error: GatewayError },
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }
}

/// Drain an event stream down to its final assistant message.
pub async fn collect_message(mut events: EventStream) -> Result<AssistantMessage, GatewayError> {
    while let Some(event) = events.next().await {
        match event {
            StreamEvent::Done { message, .. } => return Ok(message),
            StreamEvent::Error { error } => return Err(error),
            _ => {}
        }
    }
    Err(GatewayError::MalformedResponse(
        "stream ended without a final message".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[test]
    fn terminal_classification() {
        let done = StreamEvent::Done {
            message: AssistantMessage::text("hi"),
            stop_reason: StopReason::EndTurn,
        };
        assert!(done.is_terminal());
        let delta = StreamEvent::TextDelta { delta: "x".into() };
        assert!(!delta.is_terminal());
    }

    #[tokio::test]
    async fn collect_returns_done_message() {
        let events: EventStream = Box::pin(stream::iter(vec![
            StreamEvent::Start,
            StreamEvent::TextDelta { delta: "hi".into() },
            StreamEvent::Done {
                message: AssistantMessage::text("hi"),
                stop_reason: StopReason::EndTurn,
            },
        ]));
        let msg = collect_message(events).await.unwrap();
        assert_eq!(msg.text_content(), "hi");
    }

    #[tokio::test]
    async fn collect_surfaces_error() {
        let events: EventStream = Box::pin(stream::iter(vec![
            StreamEvent::Start,
            StreamEvent::Error {
                error: GatewayError::NetworkError("reset".into()),
            },
        ]));
        let err = collect_message(events).await.unwrap_err();
        assert_eq!(err.error_kind(), "network_error");
    }

    #[tokio::test]
    async fn collect_rejects_truncated_stream() {
        let events: EventStream = Box::pin(stream::iter(vec![StreamEvent::Start]));
        let err = collect_message(events).await.unwrap_err();
        assert!(err.is_fatal());
    }
}
