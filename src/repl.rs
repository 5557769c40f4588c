use std::io::Write;
use std::path::{Path, PathBuf};
use std::pin::pin;

use anyhow::{Context, Result};
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

use kgchat_core::state::Artifact;
use kgchat_engine::session::THINKING;
use kgchat_engine::{render_message, Block, Session};

use crate::commands::{self, ChatCommand};

/// Read lines from stdin until `/quit` or end of input.
pub async fn run(session: &mut Session, output_dir: &Path) -> Result<()> {
    print_agent_header(session);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush().ok();
        let Some(line) = lines.next_line().await.context("failed to read input")? else {
            break;
        };

        let command = match commands::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        match command {
            ChatCommand::Quit => break,
            ChatCommand::Help => println!("{}", commands::HELP),
            ChatCommand::Agents => print_agents(session),
            ChatCommand::Use(name) => match session.select(&name) {
                Ok(()) => print_agent_header(session),
                Err(e) => println!("{e}"),
            },
            ChatCommand::Tools(show) => {
                session.set_show_tool_calls(show);
                println!("tool calls {}", if show { "shown" } else { "hidden" });
            }
            ChatCommand::Clear => {
                session.clear_all();
                println!("all conversations cleared");
                print_agent_header(session);
            }
            ChatCommand::Cost => {
                let agent = session.current_agent();
                println!(
                    "Total cost: {} ({} prompt + {} completion tokens, next request ~{} tokens)",
                    session.cost_display(),
                    agent.totals().prompt_tokens,
                    agent.totals().completion_tokens,
                    agent.estimate_context_tokens()
                );
            }
            ChatCommand::Export(path) => match session.export_to_file(&path) {
                Ok(()) => println!("conversations exported to {}", path.display()),
                Err(e) => println!("export failed: {e}"),
            },
            ChatCommand::Import(path) => match session.import_from_file(&path) {
                Ok(()) => {
                    println!("conversations imported from {}", path.display());
                    replay(session);
                }
                Err(e) => println!("import failed: {e}"),
            },
            ChatCommand::Say(text) => {
                chat(session, &text).await;
                match save_artifacts(session.take_artifacts(), output_dir) {
                    Ok(paths) => {
                        for path in paths {
                            println!("[download] {}", path.display());
                        }
                    }
                    Err(e) => println!("could not save download: {e:#}"),
                }
            }
        }
    }
    info!(session_id = %session.id(), "chat ended");
    Ok(())
}

async fn chat(session: &mut Session, text: &str) {
    let show = session.show_tool_calls();
    let mut round = pin!(session.run_round(text));
    eprintln!("{THINKING}");
    while let Some(item) = round.next().await {
        match item {
            Ok(message) => {
                let rendered = render_message(&message, show);
                print_blocks(&rendered.blocks);
                if rendered.status != THINKING {
                    eprintln!("{}", rendered.status);
                }
            }
            Err(e) => {
                error!(error = %e, "round failed");
                println!("error: {e}");
                break;
            }
        }
    }
}

/// Show an imported conversation.
fn replay(session: &Session) {
    print_agent_header(session);
    for message in session.current_agent().messages() {
        print_blocks(&session.render(message).blocks);
    }
}

fn print_agent_header(session: &Session) {
    let entry = session.current_entry();
    println!("== {} ==", entry.name);
    if let Some(greeting) = session.greeting() {
        println!("{greeting}\n");
    }
}

fn print_agents(session: &Session) {
    let current = &session.current_entry().name;
    for entry in session.catalog().entries() {
        let marker = if &entry.name == current { "*" } else { " " };
        println!("{marker} {}: {}", entry.name, entry.description);
    }
}

fn print_blocks(blocks: &[Block]) {
    for block in blocks {
        match block {
            Block::User(text) => println!("you: {text}"),
            Block::Assistant(text) => println!("\n{text}\n"),
            Block::ToolCall(text) => println!("  [tool] {text}"),
            Block::ToolResult(text) => println!("  [result] {text}"),
        }
    }
}

/// Write download artifacts into `dir`, returning the files written.
pub fn save_artifacts(artifacts: Vec<Artifact>, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let Artifact::Download {
            label,
            file_name,
            contents,
        } = artifact;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
        let path = dir.join(&file_name);
        std::fs::write(&path, contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(label = %label, path = %path.display(), "artifact saved");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifacts_written_to_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("downloads");
        let written = save_artifacts(
            vec![Artifact::Download {
                label: "Download competency questions".into(),
                file_name: "competency_questions.json".into(),
                contents: r#"[{"question": "q", "query": "RETURN 1", "expected_answer": "1"}]"#.into(),
            }],
            &out,
        )
        .unwrap();

        assert_eq!(written, vec![out.join("competency_questions.json")]);
        let saved = std::fs::read_to_string(&written[0]).unwrap();
        assert!(saved.contains("expected_answer"));
    }

    #[test]
    fn no_artifacts_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("never-created");
        assert!(save_artifacts(Vec::new(), &out).unwrap().is_empty());
        assert!(!out.exists());
    }
}
