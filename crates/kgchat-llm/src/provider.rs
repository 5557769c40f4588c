use std::time::Duration;

use async_trait::async_trait;
use futures::stream;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};

use kgchat_core::context::LlmContext;
use kgchat_core::errors::GatewayError;
use kgchat_core::provider::{EventStream, LlmProvider, StreamOptions};

use crate::converter::{self, ChatCompletion};
use crate::models;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection parameters for an OpenAI-compatible chat completions API.
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<SecretString>,
    pub request_timeout: Duration,
}

/// Chat completions provider. Each call performs one non-streaming request and
/// replays the decoded message as a finite event stream.
pub struct OpenAiProvider {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<SecretString>,
    context_window: usize,
    request_timeout: Duration,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::NetworkError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            context_window: models::context_window_for(&config.model),
            model: config.model,
            api_key: config.api_key,
            request_timeout: config.request_timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn context_window(&self) -> usize {
        self.context_window
    }

    fn supports_tools(&self) -> bool {
        true
    }

    #[instrument(skip(self, context, options), fields(model = %self.model, messages = context.messages.len()))]
    async fn stream(
        &self,
        context: &LlmContext,
        options: &StreamOptions,
    ) -> Result<EventStream, GatewayError> {
        let body = converter::build_request_body(context, options, &self.model);

        let mut req = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key.expose_secret());
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout(self.request_timeout)
            } else {
                GatewayError::NetworkError(e.to_string())
            }
        })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let retry_after = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            let body = resp.text().await.unwrap_or_default();
            return Err(match GatewayError::from_status(status, body) {
                GatewayError::RateLimited { .. } => GatewayError::RateLimited { retry_after },
                other => other,
            });
        }

        let completion: ChatCompletion = resp
            .json()
            .await
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;
        let message = converter::parse_completion(completion)?;

        debug!(
            tool_calls = message.tool_calls().len(),
            prompt_tokens = message.usage.map(|u| u.prompt_tokens),
            completion_tokens = message.usage.map(|u| u.completion_tokens),
            "completion received"
        );

        Ok(Box::pin(stream::iter(converter::message_events(message))))
    }
}
