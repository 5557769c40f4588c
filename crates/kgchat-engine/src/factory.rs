use std::sync::Arc;
use std::time::Duration;

use kgchat_core::provider::{LlmProvider, StreamOptions};
use kgchat_core::tools::Tool;
use kgchat_graph::GraphStore;
use kgchat_settings::KgchatSettings;

use crate::agent::{AgentConfig, ConversationalAgent};
use crate::budget::ResponseBudget;
use crate::pipeline::CompetencyPipeline;
use crate::profiles::AgentProfile;
use crate::query::QueryExecutor;
use crate::registry::ToolRegistry;
use crate::search::{KeywordSearchClient, SearchConfig};
use crate::tools::competency::{DownloadCompetencyQuestionsTool, TestCompetencyQuestionTool};
use crate::tools::feedback::ProvideFeedbackTool;
use crate::tools::query_graph::QueryGraphTool;
use crate::tools::search::SearchTool;
use crate::tools::ToolKind;

/// Builds agents from profiles, injecting the shared completion engine,
/// query executor and search client. Cheap to clone.
#[derive(Clone)]
pub struct AgentFactory {
    provider: Arc<dyn LlmProvider>,
    executor: Arc<QueryExecutor>,
    search: Arc<KeywordSearchClient>,
    config: AgentConfig,
}

impl AgentFactory {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        executor: Arc<QueryExecutor>,
        search: Arc<KeywordSearchClient>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            executor,
            search,
            config,
        }
    }

    /// Wire the shared capabilities from loaded settings.
    pub fn from_settings(
        settings: &KgchatSettings,
        provider: Arc<dyn LlmProvider>,
        store: Arc<dyn GraphStore>,
    ) -> Result<Self, reqwest::Error> {
        let budget = ResponseBudget::new(settings.agent.max_response_tokens);
        let search = KeywordSearchClient::new(
            SearchConfig {
                url: settings.search.url.clone(),
                page_size: settings.search.page_size,
                timeout: Duration::from_millis(settings.search.timeout_ms),
            },
            budget,
        )?;
        let config = AgentConfig {
            max_turns: settings.agent.max_turns,
            stream_options: StreamOptions {
                max_tokens: settings.llm.max_tokens,
                temperature: settings.llm.temperature,
            },
        };
        Ok(Self::new(
            provider,
            Arc::new(QueryExecutor::new(store, budget)),
            Arc::new(search),
            config,
        ))
    }

    pub fn build(&self, name: impl Into<String>, profile: &AgentProfile) -> ConversationalAgent {
        ConversationalAgent::new(
            name,
            profile,
            self.registry(&profile.tools),
            Arc::clone(&self.provider),
            self.config.clone(),
        )
    }

    fn registry(&self, kinds: &[ToolKind]) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        for kind in kinds {
            let tool: Arc<dyn Tool> = match kind {
                ToolKind::QueryKg => Arc::new(QueryGraphTool::new(Arc::clone(&self.executor))),
                ToolKind::Search => Arc::new(SearchTool::new(Arc::clone(&self.search))),
                ToolKind::TestCompetencyQuestion => Arc::new(TestCompetencyQuestionTool::new(
                    CompetencyPipeline::new(self.clone()),
                )),
                ToolKind::DownloadCompetencyQuestions => Arc::new(DownloadCompetencyQuestionsTool),
                ToolKind::ProvideFeedback => Arc::new(ProvideFeedbackTool),
            };
            registry.register(tool);
        }
        registry
    }
}

#[cfg(test)]
pub(crate) fn test_factory(
    provider: Arc<kgchat_llm::MockProvider>,
    store: Arc<kgchat_graph::MemoryGraphStore>,
) -> AgentFactory {
    let search = KeywordSearchClient::new(
        SearchConfig {
            url: "http://127.0.0.1:9/search".into(),
            page_size: 5,
            timeout: Duration::from_millis(200),
        },
        ResponseBudget::default(),
    )
    .unwrap();
    AgentFactory::new(
        provider,
        Arc::new(QueryExecutor::new(store, ResponseBudget::default())),
        Arc::new(search),
        AgentConfig::default(),
    )
}
