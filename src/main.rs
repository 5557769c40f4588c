//! # kgchat
//!
//! Terminal chat with agents over a knowledge graph. Loads settings, wires the
//! completion engine and graph store into the agent catalog, and runs the
//! interactive loop.

#![deny(unsafe_code)]

mod commands;
mod repl;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use kgchat_engine::{AgentCatalog, AgentFactory, Session};
use kgchat_graph::{Neo4jConfig, Neo4jHttpStore};
use kgchat_llm::{OpenAiConfig, OpenAiProvider, ReliableConfig, ReliableProvider};
use kgchat_settings::{KgchatSettings, SettingsError};
use kgchat_telemetry::{init_telemetry, TelemetryConfig};

#[derive(Parser, Debug)]
#[command(name = "kgchat", about = "Chat with LLM agents over a knowledge graph")]
struct Cli {
    /// Settings file (defaults to ~/.kgchat/settings.json).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the available agents.
    Agents,
    /// Start an interactive chat.
    Chat {
        /// Agent to start with.
        #[arg(long)]
        agent: Option<String>,
        /// Show tool calls and their results.
        #[arg(long)]
        show_tool_calls: bool,
        /// Restore conversations from a previous export.
        #[arg(long)]
        import: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => kgchat_settings::load_settings_from_explicit(path),
        None => kgchat_settings::load_settings(),
    }
    .context("failed to load settings")?;

    init_telemetry(&TelemetryConfig::from_levels(
        &settings.logging.level,
        &settings.logging.modules,
        settings.logging.json,
    )?)?;

    let catalog = AgentCatalog::standard(&settings.catalog).context("failed to build agent catalog")?;

    match cli.command {
        Command::Agents => {
            for entry in catalog.entries() {
                println!("{}\n  {}\n  tools: {}", entry.name, entry.description, tool_list(entry));
            }
            Ok(())
        }
        Command::Chat {
            agent,
            show_tool_calls,
            import,
        } => {
            let factory = build_factory(&settings)?;
            let mut session = Session::new(catalog, factory)?;
            session.set_show_tool_calls(show_tool_calls);
            if let Some(path) = import {
                session
                    .import_from_file(&path)
                    .with_context(|| format!("failed to import {}", path.display()))?;
            }
            if let Some(name) = agent {
                session.select(&name)?;
            }
            tracing::info!(session_id = %session.id(), agent = %session.current_entry().name, "chat started");
            repl::run(&mut session, &settings.output.dir).await
        }
    }
}

fn tool_list(entry: &kgchat_engine::CatalogEntry) -> String {
    entry
        .profile
        .tools
        .iter()
        .map(|t| t.tool_name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Completion engine with retries, the Neo4j store, and the search client.
fn build_factory(settings: &KgchatSettings) -> Result<AgentFactory> {
    let api_key = settings
        .llm
        .api_key
        .clone()
        .ok_or(SettingsError::Missing("llm.apiKey (or OPENAI_API_KEY)"))?;

    let openai = OpenAiProvider::new(OpenAiConfig {
        base_url: settings.llm.base_url.clone(),
        model: settings.llm.model.clone(),
        api_key: Some(api_key),
        request_timeout: Duration::from_millis(settings.llm.request_timeout_ms),
    })?;
    let retry = &settings.llm.retry;
    let provider = ReliableProvider::new(
        openai,
        ReliableConfig {
            max_retries: retry.max_retries,
            base_delay: Duration::from_millis(retry.base_delay_ms),
            max_delay: Duration::from_millis(retry.max_delay_ms),
            jitter_factor: retry.jitter_factor,
        },
    );

    let store = Neo4jHttpStore::new(Neo4jConfig {
        url: settings.graph.url.clone(),
        database: settings.graph.database.clone(),
        user: settings.graph.user.clone(),
        password: settings.graph.password.clone(),
        timeout: Duration::from_millis(settings.graph.timeout_ms),
    })?;
    tracing::info!(
        model = %settings.llm.model,
        graph = store.endpoint(),
        "completion engine and graph store configured"
    );

    AgentFactory::from_settings(settings, Arc::new(provider), Arc::new(store))
        .context("failed to build search client")
}
