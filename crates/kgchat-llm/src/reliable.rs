use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::warn;

use kgchat_core::context::LlmContext;
use kgchat_core::errors::GatewayError;
use kgchat_core::provider::{EventStream, LlmProvider, StreamOptions};

/// Retry behavior for the ReliableProvider.
#[derive(Clone, Debug)]
pub struct ReliableConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter_factor: f64,
}

impl Default for ReliableConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter_factor: 0.2,
        }
    }
}

/// Wraps an LlmProvider with retry logic.
///
/// - Retries retryable errors with exponential backoff + jitter
/// - Respects `retry_after` hints from rate limit responses
/// - Only the request itself is retried; once a stream is handed out it is
///   never replayed, so a completion's usage is reported exactly once
pub struct ReliableProvider<P: LlmProvider> {
    inner: P,
    config: ReliableConfig,
    total_retries: AtomicU64,
}

impl<P: LlmProvider> ReliableProvider<P> {
    pub fn new(inner: P, config: ReliableConfig) -> Self {
        Self {
            inner,
            config,
            total_retries: AtomicU64::new(0),
        }
    }

    pub fn with_defaults(inner: P) -> Self {
        Self::new(inner, ReliableConfig::default())
    }

    /// Calculate delay for a retry attempt using exponential backoff + jitter.
    fn retry_delay(&self, attempt: u32, suggested: Option<Duration>) -> Duration {
        if let Some(delay) = suggested {
            return delay;
        }

        let exp_delay =
            self.config.base_delay.as_millis() as f64 * 2.0_f64.powi(attempt.min(30) as i32);
        let capped = exp_delay.min(self.config.max_delay.as_millis() as f64);

        let jitter_range = capped * self.config.jitter_factor.clamp(0.0, 1.0);
        let jitter = if jitter_range > 0.0 {
            rand::thread_rng().gen_range(-jitter_range..=jitter_range)
        } else {
            0.0
        };

        Duration::from_millis((capped + jitter).max(0.0) as u64)
    }

    pub fn total_retries(&self) -> u64 {
        self.total_retries.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl<P: LlmProvider> LlmProvider for ReliableProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    fn context_window(&self) -> usize {
        self.inner.context_window()
    }

    fn supports_tools(&self) -> bool {
        self.inner.supports_tools()
    }

    async fn stream(
        &self,
        context: &LlmContext,
        options: &StreamOptions,
    ) -> Result<EventStream, GatewayError> {
        let mut attempt = 0;
        loop {
            match self.inner.stream(context, options).await {
                Ok(stream) => return Ok(stream),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.retry_delay(attempt, e.suggested_delay());
                    self.total_retries.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error_kind = e.error_kind(),
                        error = %e,
                        "retrying completion after error"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{usage, MockProvider, MockResponse};

    fn server_error() -> MockResponse {
        MockResponse::Error(GatewayError::ServerError {
            status: 500,
            body: "internal".into(),
        })
    }

    fn fast() -> ReliableConfig {
        ReliableConfig {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn success_on_first_try() {
        let mock = MockProvider::new(vec![MockResponse::text("hello", usage(1, 1))]);
        let reliable = ReliableProvider::with_defaults(mock);
        let result = reliable
            .stream(&LlmContext::empty(), &StreamOptions::default())
            .await;
        assert!(result.is_ok());
        assert_eq!(reliable.total_retries(), 0);
    }

    #[tokio::test]
    async fn retries_on_retryable_error() {
        let mock = MockProvider::new(vec![
            server_error(),
            MockResponse::Error(GatewayError::NetworkError("reset".into())),
            MockResponse::text("recovered", usage(1, 1)),
        ]);
        let reliable = ReliableProvider::new(mock, fast());
        let result = reliable
            .stream(&LlmContext::empty(), &StreamOptions::default())
            .await;
        assert!(result.is_ok());
        assert_eq!(reliable.total_retries(), 2);
    }

    #[tokio::test]
    async fn fatal_error_not_retried() {
        let mock = MockProvider::new(vec![
            MockResponse::Error(GatewayError::AuthenticationFailed("bad key".into())),
            MockResponse::text("should not reach", usage(1, 1)),
        ]);
        let reliable = ReliableProvider::new(mock, fast());
        let err = reliable
            .stream(&LlmContext::empty(), &StreamOptions::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, GatewayError::AuthenticationFailed(_)));
        assert_eq!(reliable.total_retries(), 0);
    }

    #[tokio::test]
    async fn max_retries_exhausted() {
        let mock = MockProvider::new(vec![
            server_error(),
            server_error(),
            server_error(),
            server_error(),
        ]);
        let reliable = ReliableProvider::new(mock, fast());
        let result = reliable
            .stream(&LlmContext::empty(), &StreamOptions::default())
            .await;
        assert!(matches!(result, Err(GatewayError::ServerError { .. })));
        assert_eq!(reliable.total_retries(), 3);
    }

    #[test]
    fn retry_delay_respects_suggested() {
        let reliable = ReliableProvider::with_defaults(MockProvider::new(vec![]));
        let delay = reliable.retry_delay(0, Some(Duration::from_secs(5)));
        assert_eq!(delay, Duration::from_secs(5));
    }

    #[test]
    fn retry_delay_exponential_backoff() {
        let config = ReliableConfig {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            jitter_factor: 0.0,
            ..Default::default()
        };
        let reliable = ReliableProvider::new(MockProvider::new(vec![]), config);
        assert_eq!(reliable.retry_delay(0, None).as_millis(), 100);
        assert_eq!(reliable.retry_delay(1, None).as_millis(), 200);
        assert_eq!(reliable.retry_delay(2, None).as_millis(), 400);
    }

    #[test]
    fn retry_delay_capped_and_jittered_within_bounds() {
        let config = ReliableConfig {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            jitter_factor: 0.2,
            ..Default::default()
        };
        let reliable = ReliableProvider::new(MockProvider::new(vec![]), config);
        for _ in 0..50 {
            let ms = reliable.retry_delay(10, None).as_millis();
            assert!((4000..=6000).contains(&ms), "delay {ms} out of bounds");
        }
    }

    #[test]
    fn provider_delegates_properties() {
        let reliable = ReliableProvider::with_defaults(MockProvider::new(vec![]));
        assert_eq!(reliable.name(), "mock");
        assert_eq!(reliable.model(), "mock-model");
        assert_eq!(reliable.context_window(), 128_000);
        assert!(reliable.supports_tools());
    }
}
