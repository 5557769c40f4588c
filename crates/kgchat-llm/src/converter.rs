//! Conversion between the internal transcript and the chat completions wire format.

use serde::Deserialize;
use serde_json::{json, Value};

use kgchat_core::context::LlmContext;
use kgchat_core::errors::GatewayError;
use kgchat_core::ids::ToolCallId;
use kgchat_core::messages::{AssistantContent, AssistantMessage, Message, StopReason, ToolCallBlock};
use kgchat_core::provider::StreamOptions;
use kgchat_core::stream::StreamEvent;
use kgchat_core::tokens::TokenUsage;

/// Convert a full LlmContext into the chat completions request body.
pub fn build_request_body(context: &LlmContext, options: &StreamOptions, model: &str) -> Value {
    let mut body = json!({
        "model": model,
        "messages": convert_messages(context),
    });

    if let Some(max) = options.max_tokens {
        body["max_tokens"] = json!(max);
    }
    if let Some(temp) = options.temperature {
        body["temperature"] = json!(temp);
    }

    if !context.tools.is_empty() {
        let tools: Vec<Value> = context
            .tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters_schema,
                    }
                })
            })
            .collect();
        body["tools"] = json!(tools);
    }

    body
}

fn convert_messages(context: &LlmContext) -> Vec<Value> {
    let mut out = Vec::with_capacity(context.messages.len() + 1);
    if !context.system_prompt.is_empty() {
        out.push(json!({"role": "system", "content": context.system_prompt}));
    }
    for msg in &context.messages {
        out.push(convert_message(msg));
    }
    out
}

fn convert_message(msg: &Message) -> Value {
    match msg {
        Message::User(user) => json!({"role": "user", "content": user.content}),
        Message::Assistant(assistant) => {
            let text = assistant.text_content();
            let content = if text.is_empty() {
                Value::Null
            } else {
                Value::String(text)
            };
            let mut value = json!({"role": "assistant", "content": content});
            let calls: Vec<Value> = assistant
                .tool_calls()
                .into_iter()
                .map(|tc| {
                    json!({
                        "id": tc.id,
                        "type": "function",
                        "function": {
                            "name": tc.name,
                            "arguments": arguments_to_wire(&tc.arguments),
                        }
                    })
                })
                .collect();
            if !calls.is_empty() {
                value["tool_calls"] = json!(calls);
            }
            value
        }
        Message::ToolResult(result) => json!({
            "role": "tool",
            "tool_call_id": result.tool_call_id,
            "content": result.content,
        }),
    }
}

/// The API carries arguments as a JSON-encoded string. Arguments that failed to
/// parse on the way in are kept as the raw string and sent back unchanged.
fn arguments_to_wire(arguments: &Value) -> String {
    match arguments {
        Value::String(raw) => raw.clone(),
        other => other.to_string(),
    }
}

// ── Response side ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChatCompletion {
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ResponseToolCall>>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseToolCall {
    pub id: String,
    pub function: FunctionCall,
}

#[derive(Debug, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

pub fn map_finish_reason(reason: Option<&str>, has_tool_calls: bool) -> StopReason {
    match reason {
        Some("tool_calls" | "function_call") => StopReason::ToolUse,
        Some("length") => StopReason::MaxTokens,
        Some("content_filter") => StopReason::ContentFilter,
        _ if has_tool_calls => StopReason::ToolUse,
        _ => StopReason::EndTurn,
    }
}

/// Turn a decoded completion into an assistant message.
pub fn parse_completion(completion: ChatCompletion) -> Result<AssistantMessage, GatewayError> {
    let Some(choice) = completion.choices.into_iter().next() else {
        return Err(GatewayError::MalformedResponse("response has no choices".into()));
    };

    let mut content = Vec::new();
    if let Some(text) = choice.message.content.filter(|t| !t.is_empty()) {
        content.push(AssistantContent::Text { text });
    }
    for call in choice.message.tool_calls.unwrap_or_default() {
        let arguments = if call.function.arguments.trim().is_empty() {
            json!({})
        } else {
            serde_json::from_str(&call.function.arguments)
                .unwrap_or(Value::String(call.function.arguments))
        };
        content.push(AssistantContent::ToolCall(ToolCallBlock {
            id: ToolCallId::from_raw(call.id),
            name: call.function.name,
            arguments,
        }));
    }

    let has_tool_calls = content
        .iter()
        .any(|c| matches!(c, AssistantContent::ToolCall(_)));
    let stop_reason = map_finish_reason(choice.finish_reason.as_deref(), has_tool_calls);
    let usage = completion.usage.map(|u| TokenUsage {
        prompt_tokens: u.prompt_tokens,
        completion_tokens: u.completion_tokens,
    });

    Ok(AssistantMessage {
        content,
        usage,
        stop_reason: Some(stop_reason),
    })
}

/// Replay a complete message as the event sequence a streaming provider would emit.
pub fn message_events(message: AssistantMessage) -> Vec<StreamEvent> {
    let mut events = vec![StreamEvent::Start];
    for block in &message.content {
        match block {
            AssistantContent::Text { text } => events.push(StreamEvent::TextDelta {
                delta: text.clone(),
            }),
            AssistantContent::ToolCall(tc) => events.push(StreamEvent::ToolCall {
                tool_call: tc.clone(),
            }),
        }
    }
    let stop_reason = message.stop_reason.clone().unwrap_or(StopReason::EndTurn);
    events.push(StreamEvent::Done {
        message,
        stop_reason,
    });
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgchat_core::tools::ToolDefinition;

    fn completion(raw: Value) -> ChatCompletion {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn request_includes_system_prompt_first() {
        let ctx = LlmContext {
            system_prompt: "You are helpful.".into(),
            messages: vec![Message::user_text("hi")],
            tools: vec![],
        };
        let body = build_request_body(&ctx, &StreamOptions::default(), "gpt-4o");
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "You are helpful.");
        assert_eq!(body["messages"][1]["role"], "user");
        assert!(body.get("tools").is_none());
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn request_converts_tool_round_trip() {
        let call = ToolCallBlock {
            id: ToolCallId::from_raw("call_1"),
            name: "query_kg".into(),
            arguments: json!({"query": "RETURN 1"}),
        };
        let ctx = LlmContext {
            system_prompt: String::new(),
            messages: vec![
                Message::user_text("q"),
                Message::Assistant(AssistantMessage {
                    content: vec![AssistantContent::ToolCall(call)],
                    usage: None,
                    stop_reason: Some(StopReason::ToolUse),
                }),
                Message::tool_result(ToolCallId::from_raw("call_1"), "query_kg", "[]", false),
            ],
            tools: vec![ToolDefinition {
                name: "query_kg".into(),
                description: "Run a query".into(),
                parameters_schema: json!({"type": "object"}),
            }],
        };
        let body = build_request_body(
            &ctx,
            &StreamOptions {
                max_tokens: Some(512),
                temperature: Some(0.0),
            },
            "gpt-4",
        );
        let msgs = body["messages"].as_array().unwrap();
        assert_eq!(msgs.len(), 3);
        assert!(msgs[1]["content"].is_null());
        assert_eq!(msgs[1]["tool_calls"][0]["id"], "call_1");
        assert_eq!(msgs[1]["tool_calls"][0]["function"]["name"], "query_kg");
        assert_eq!(
            msgs[1]["tool_calls"][0]["function"]["arguments"],
            r#"{"query":"RETURN 1"}"#
        );
        assert_eq!(msgs[2]["role"], "tool");
        assert_eq!(msgs[2]["tool_call_id"], "call_1");
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["parameters"]["type"], "object");
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["temperature"], 0.0);
    }

    #[test]
    fn parse_text_completion() {
        let msg = parse_completion(completion(json!({
            "choices": [{"message": {"role": "assistant", "content": "Hello"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        })))
        .unwrap();
        assert_eq!(msg.text_content(), "Hello");
        assert_eq!(msg.stop_reason, Some(StopReason::EndTurn));
        assert_eq!(
            msg.usage,
            Some(TokenUsage {
                prompt_tokens: 12,
                completion_tokens: 3
            })
        );
    }

    #[test]
    fn parse_tool_call_completion() {
        let msg = parse_completion(completion(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "functions.search", "arguments": "{\"terms\": [\"CARD9\"]}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        })))
        .unwrap();
        assert_eq!(msg.stop_reason, Some(StopReason::ToolUse));
        let calls = msg.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id.as_str(), "call_abc");
        assert_eq!(calls[0].name, "functions.search");
        assert_eq!(calls[0].arguments["terms"][0], "CARD9");
        assert!(msg.usage.is_none());
    }

    #[test]
    fn unparseable_arguments_kept_raw() {
        let msg = parse_completion(completion(json!({
            "choices": [{
                "message": {"tool_calls": [{"id": "c", "function": {"name": "query_kg", "arguments": "{not json"}}]},
                "finish_reason": "tool_calls"
            }]
        })))
        .unwrap();
        assert_eq!(msg.tool_calls()[0].arguments, Value::String("{not json".into()));
        assert_eq!(arguments_to_wire(&msg.tool_calls()[0].arguments), "{not json");
    }

    #[test]
    fn empty_choices_is_malformed() {
        let err = parse_completion(completion(json!({"choices": []}))).unwrap_err();
        assert!(matches!(err, GatewayError::MalformedResponse(_)));
    }

    #[test]
    fn finish_reason_mapping() {
        assert_eq!(map_finish_reason(Some("stop"), false), StopReason::EndTurn);
        assert_eq!(map_finish_reason(Some("function_call"), false), StopReason::ToolUse);
        assert_eq!(map_finish_reason(Some("length"), false), StopReason::MaxTokens);
        assert_eq!(map_finish_reason(Some("content_filter"), false), StopReason::ContentFilter);
        assert_eq!(map_finish_reason(None, true), StopReason::ToolUse);
    }

    #[test]
    fn events_end_with_done() {
        let events = message_events(AssistantMessage::text("hi"));
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], StreamEvent::Start));
        assert!(matches!(&events[1], StreamEvent::TextDelta { delta } if delta == "hi"));
        assert!(events[2].is_terminal());
    }
}
