#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("graph request failed: {0}")]
    Transport(String),
    #[error("graph server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("{code}: {message}")]
    Query { code: String, message: String },
    #[error("unexpected graph response: {0}")]
    Decode(String),
}

impl GraphError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Status { .. } => "status",
            Self::Query { .. } => "query",
            Self::Decode(_) => "decode",
        }
    }
}
