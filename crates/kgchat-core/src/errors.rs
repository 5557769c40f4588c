use std::time::Duration;

/// Errors raised by the completion engine.
/// Classifies errors as fatal (don't retry), retryable, or operational.
#[derive(Clone, Debug, thiserror::Error)]
pub enum GatewayError {
    // Fatal
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("context window exceeded: {0}")]
    ContextWindowExceeded(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    // Retryable
    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },
    #[error("server error {status}: {body}")]
    ServerError { status: u16, body: String },
    #[error("network error: {0}")]
    NetworkError(String),

    // Operational
    #[error("timeout after {0:?}")]
    Timeout(Duration),
}

impl GatewayError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::ServerError { .. } | Self::NetworkError(_)
        )
    }

    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed(_)
                | Self::ContextWindowExceeded(_)
                | Self::InvalidRequest(_)
                | Self::MalformedResponse(_)
        )
    }

    pub fn suggested_delay(&self) -> Option<Duration> {
        if let Self::RateLimited { retry_after } = self {
            *retry_after
        } else {
            None
        }
    }

    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed(_) => "authentication_failed",
            Self::ContextWindowExceeded(_) => "context_window_exceeded",
            Self::InvalidRequest(_) => "invalid_request",
            Self::MalformedResponse(_) => "malformed_response",
            Self::RateLimited { .. } => "rate_limited",
            Self::ServerError { .. } => "server_error",
            Self::NetworkError(_) => "network_error",
            Self::Timeout(_) => "timeout",
        }
    }

    /// Classify an HTTP status code into the appropriate error variant.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::AuthenticationFailed(body),
            400 if body.contains("context_length_exceeded") => Self::ContextWindowExceeded(body),
            400 | 404 | 422 => Self::InvalidRequest(body),
            429 => Self::RateLimited { retry_after: None },
            500..=599 => Self::ServerError { status, body },
            _ => Self::InvalidRequest(format!("unexpected status {status}: {body}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(GatewayError::RateLimited { retry_after: None }.is_retryable());
        assert!(GatewayError::ServerError {
            status: 500,
            body: "err".into()
        }
        .is_retryable());
        assert!(GatewayError::NetworkError("tcp".into()).is_retryable());
    }

    #[test]
    fn fatal_classification() {
        assert!(GatewayError::AuthenticationFailed("bad key".into()).is_fatal());
        assert!(GatewayError::InvalidRequest("bad".into()).is_fatal());
        assert!(GatewayError::MalformedResponse("no choices".into()).is_fatal());
    }

    #[test]
    fn timeout_is_neither() {
        let timeout = GatewayError::Timeout(Duration::from_secs(30));
        assert!(!timeout.is_retryable());
        assert!(!timeout.is_fatal());
    }

    #[test]
    fn suggested_delay_only_for_rate_limit() {
        let rl = GatewayError::RateLimited {
            retry_after: Some(Duration::from_secs(5)),
        };
        assert_eq!(rl.suggested_delay(), Some(Duration::from_secs(5)));
        let se = GatewayError::ServerError {
            status: 500,
            body: "err".into(),
        };
        assert_eq!(se.suggested_delay(), None);
    }

    #[test]
    fn from_status_mapping() {
        assert!(GatewayError::from_status(401, "unauthorized".into()).is_fatal());
        assert!(GatewayError::from_status(400, "bad request".into()).is_fatal());
        assert!(matches!(
            GatewayError::from_status(400, "code: context_length_exceeded".into()),
            GatewayError::ContextWindowExceeded(_)
        ));
        assert!(GatewayError::from_status(429, "slow down".into()).is_retryable());
        assert!(GatewayError::from_status(503, "unavailable".into()).is_retryable());
    }

    #[test]
    fn error_kind_strings() {
        assert_eq!(
            GatewayError::RateLimited { retry_after: None }.error_kind(),
            "rate_limited"
        );
        assert_eq!(
            GatewayError::NetworkError("x".into()).error_kind(),
            "network_error"
        );
    }
}
