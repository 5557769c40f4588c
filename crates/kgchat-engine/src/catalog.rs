use std::path::Path;

use tracing::info;

use kgchat_core::competency::CompetencyQuestion;
use kgchat_core::tokens::TokenTotals;
use kgchat_settings::CatalogSettings;

use crate::error::CatalogError;
use crate::profiles::AgentProfile;
use crate::prompts;

pub const MONARCH_ASSISTANT: &str = "Monarch Assistant";
pub const COMPETENCY_QUESTION_AGENT: &str = "Competency Question Agent";

const MONARCH_GREETING: &str = "\
I'm the Monarch Assistant, an AI chatbot with access to the [Monarch Inititive](https://monarchinitiative.org) biomedical knowledgebase. I can search for information on diseases, genes, and phenotypes. Here are some things you might try asking:

- What is the genetic basis of Cystic Fibrosis?
- What symptoms are associated with Fanconi Anemia?
- Which symptoms are shared by two or more forms of Progressive External Ophthalmoplegia?

Please note that I am a research preview, and this information should not be used for diagnoses, clinical decision making, or other medical applications.";

const COMPETENCY_GREETING: &str = "Hello! I am here to help you explore a neo4j graph, understand the kinds of questions it can answer and queries to answer those questions, and test those queries to develop a set of competency questions. We'll start by looking at the different kinds of nodes and relationships in the graph. Should we begin?";

/// Price of tokens in USD per thousand.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TokenCosts {
    pub prompt_per_1k: f64,
    pub completion_per_1k: f64,
}

impl TokenCosts {
    pub fn cost(&self, totals: TokenTotals) -> f64 {
        totals.prompt_tokens as f64 / 1000.0 * self.prompt_per_1k
            + totals.completion_tokens as f64 / 1000.0 * self.completion_per_1k
    }
}

/// One selectable agent. The greeting is shown to the user only.
#[derive(Clone, Debug)]
pub struct CatalogEntry {
    pub name: String,
    pub greeting: String,
    pub description: String,
    pub profile: AgentProfile,
    pub costs: TokenCosts,
}

#[derive(Clone, Debug)]
pub struct AgentCatalog {
    entries: Vec<CatalogEntry>,
}

impl AgentCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// The Monarch assistant and the competency-question explorer. Files
    /// named in the settings must exist and parse.
    pub fn standard(settings: &CatalogSettings) -> Result<Self, CatalogError> {
        let costs = TokenCosts {
            prompt_per_1k: settings.prompt_cost_per_1k,
            completion_per_1k: settings.completion_cost_per_1k,
        };
        let monarch_prompt = monarch_prompt(settings)?;

        Ok(Self::new(vec![
            CatalogEntry {
                name: MONARCH_ASSISTANT.into(),
                greeting: MONARCH_GREETING.into(),
                description:
                    "An assistant for exploring the Monarch Iniative biomedical knowledge graph."
                        .into(),
                profile: AgentProfile::monarch(monarch_prompt),
                costs,
            },
            CatalogEntry {
                name: COMPETENCY_QUESTION_AGENT.into(),
                greeting: COMPETENCY_GREETING.into(),
                description: "An agent for exploring Neo4j graphs, and generating and evaluating competency questions over them.".into(),
                profile: AgentProfile::explorer(),
                costs,
            },
        ]))
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }
}

fn monarch_prompt(settings: &CatalogSettings) -> Result<String, CatalogError> {
    let summary = match &settings.kg_summary_path {
        Some(path) => read(path)?,
        None => String::new(),
    };
    let examples = match &settings.competency_questions_path {
        Some(path) => load_competency_questions(path)?,
        None => Vec::new(),
    };
    info!(
        summary_len = summary.len(),
        examples = examples.len(),
        "assembled monarch prompt"
    );
    Ok(prompts::monarch_prompt(&summary, &examples))
}

/// Reference questions; fields other than question, search terms and query
/// are dropped.
pub fn load_competency_questions(path: &Path) -> Result<Vec<CompetencyQuestion>, CatalogError> {
    let raw = read(path)?;
    serde_json::from_str(&raw).map_err(|source| CatalogError::Questions {
        path: path.to_path_buf(),
        source,
    })
}

fn read(path: &Path) -> Result<String, CatalogError> {
    std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })
}
