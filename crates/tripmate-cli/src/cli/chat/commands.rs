//! Slash command parsing for the chat loop.

use std::path::PathBuf;

use console::style;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Clear the terminal screen.
    Clear,
    /// Rename the room; blank resets to the default name.
    Rename(String),
    /// List generated plans.
    Plans,
    /// Download a plan by id, optionally to a path.
    Download { plan_id: i64, path: Option<PathBuf> },
    /// Print the invite link.
    Invite,
    /// Show connection and plan workflow state.
    Status,
    /// Reconnect the realtime channel.
    Reconnect,
    /// Leave the room for good.
    Leave,
    /// Close the chat session.
    Exit,
    /// Unknown or malformed command.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let parts: Vec<&str> = trimmed.splitn(2, ' ').collect();
    let cmd = parts[0].to_lowercase();
    let arg = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/clear" | "/cls" => Some(ChatCommand::Clear),
        "/rename" => Some(ChatCommand::Rename(arg.to_string())),
        "/plans" => Some(ChatCommand::Plans),
        "/download" | "/dl" => Some(parse_download(arg)),
        "/invite" => Some(ChatCommand::Invite),
        "/status" => Some(ChatCommand::Status),
        "/reconnect" => Some(ChatCommand::Reconnect),
        "/leave" => Some(ChatCommand::Leave),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        other => Some(ChatCommand::Unknown(other.to_string())),
    }
}

fn parse_download(arg: &str) -> ChatCommand {
    let mut words = arg.split_whitespace();
    let Some(plan_id) = words.next().and_then(|w| w.parse::<i64>().ok()) else {
        return ChatCommand::Unknown("/download requires a plan id".to_string());
    };
    let path = words.next().map(PathBuf::from);
    ChatCommand::Download { plan_id, path }
}

/// The help text listing all available commands.
pub fn help_text() -> String {
    let rows = [
        ("/help", "Show this help message"),
        ("/rename <name>", "Rename the room"),
        ("/plans", "List generated plans"),
        ("/download <id> [path]", "Download a plan"),
        ("/invite", "Show the invite link"),
        ("/status", "Show connection and plan status"),
        ("/reconnect", "Reconnect to the room"),
        ("/clear", "Clear the screen"),
        ("/leave", "Leave the room"),
        ("/exit", "End the chat session"),
    ];

    let mut text = format!("\n  {}\n\n", style("Available commands:").bold());
    for (command, description) in rows {
        text.push_str(&format!(
            "  {} {description}\n",
            style(format!("{command:<24}")).cyan()
        ));
    }
    text.push_str(&format!(
        "\n  {}\n",
        style("Ask the planner for a trip, e.g. \"일정 짜줘\"").dim()
    ));
    text
}
