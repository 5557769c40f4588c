//! Conversational agents over the knowledge graph: tool dispatch, the
//! competency-question pipeline, the agent catalog and chat sessions.

pub mod agent;
pub mod budget;
pub mod catalog;
pub mod error;
pub mod factory;
pub mod pipeline;
pub mod profiles;
pub mod prompts;
pub mod query;
pub mod registry;
pub mod search;
pub mod session;
pub mod tools;
pub mod transcript;

pub use agent::{AgentConfig, ConversationalAgent};
pub use catalog::{AgentCatalog, CatalogEntry, TokenCosts};
pub use error::{CatalogError, EngineError, PipelineError, SessionError, TranscriptError};
pub use factory::AgentFactory;
pub use pipeline::{CompetencyPipeline, PipelineOutcome, PipelineState};
pub use session::{render_message, Block, RenderedMessage, Session};
pub use transcript::AgentTranscript;
