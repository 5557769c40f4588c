//! In-chat slash commands.

use std::path::PathBuf;

use anyhow::{bail, Result};

#[derive(Debug, PartialEq, Eq)]
pub enum ChatCommand {
    Agents,
    Use(String),
    Tools(bool),
    Clear,
    Cost,
    Export(PathBuf),
    Import(PathBuf),
    Help,
    Quit,
    Say(String),
}

pub const HELP: &str = "\
/agents          list agents (current marked with *)
/use NAME        switch to another agent
/tools on|off    show or hide tool calls and results
/clear           reset every agent's conversation
/cost            show the current agent's token cost
/export FILE     save all conversations as JSON
/import FILE     replace all conversations from a JSON export
/quit            leave";

/// Parse one line of input. Blank lines yield `None`; anything not starting
/// with `/` is a message for the current agent.
pub fn parse(line: &str) -> Result<Option<ChatCommand>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(command) = line.strip_prefix('/') else {
        return Ok(Some(ChatCommand::Say(line.to_string())));
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    let parsed = match (name, arg) {
        ("agents", "") => ChatCommand::Agents,
        ("use", "") => bail!("usage: /use NAME"),
        ("use", agent) => ChatCommand::Use(agent.to_string()),
        ("tools", "on") => ChatCommand::Tools(true),
        ("tools", "off") => ChatCommand::Tools(false),
        ("tools", _) => bail!("usage: /tools on|off"),
        ("clear", "") => ChatCommand::Clear,
        ("cost", "") => ChatCommand::Cost,
        ("export", "") => bail!("usage: /export FILE"),
        ("export", path) => ChatCommand::Export(PathBuf::from(path)),
        ("import", "") => bail!("usage: /import FILE"),
        ("import", path) => ChatCommand::Import(PathBuf::from(path)),
        ("help", _) => ChatCommand::Help,
        ("quit" | "exit", _) => ChatCommand::Quit,
        (other, _) => bail!("unknown command /{other} (try /help)"),
    };
    Ok(Some(parsed))
}
