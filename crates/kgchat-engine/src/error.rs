use kgchat_core::errors::GatewayError;
use kgchat_core::tools::ToolError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("max turns exceeded: {0}")]
    MaxTurnsExceeded(u32),

    #[error("transcript error: {0}")]
    Transcript(#[from] TranscriptError),

    #[error("{0}")]
    Internal(String),
}

/// Failure of one competency-question run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{stage} round failed: {source}")]
    Round {
        stage: &'static str,
        #[source]
        source: EngineError,
    },

    /// The evaluator finished without a usable `provide_feedback` result.
    #[error("malformed verdict: {0}")]
    MalformedVerdict(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("transcript I/O failed for {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid transcript: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid competency questions in {path}: {source}")]
    Questions {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("the agent catalog is empty")]
    EmptyCatalog,

    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    #[error("invalid chat export: {0}")]
    InvalidExport(String),

    #[error(transparent)]
    Transcript(#[from] TranscriptError),
}
