//! Terminal operator console
//!
//! Line-oriented commands on stdin, notices rendered as plain text on stdout.
//! The terminal player has no media backend: it prints what would be playing
//! and relies on the `ended` command to report a natural end.

use crate::app::{AppEvent, Notice, OperatorCommand};
use crate::coordinator::{MediaPlayer, PlayerFactory};
use tracing::info;

pub const HELP: &str = "\
Commands:
  search <query>   search for songs
  add <n>          add the n-th search result
  queue            show the shared queue
  skip             skip the current song
  ended            mark the current song as finished
  y / n            answer the pending question
  status           show connection state and queue
  reconnect        re-open the push channel
  quit             exit";

/// Parse one input line; `Ok(None)` for blank lines
pub fn parse_line(line: &str) -> Result<Option<AppEvent>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    let command = match command.to_ascii_lowercase().as_str() {
        "search" | "s" if rest.is_empty() => return Err("usage: search <query>".to_string()),
        "search" | "s" => OperatorCommand::Search(rest.to_string()),
        "add" | "a" => match rest.parse::<usize>() {
            Ok(n) if n > 0 => OperatorCommand::Add(n),
            _ => return Err("usage: add <n>  (n from the last search)".to_string()),
        },
        "queue" | "q" => OperatorCommand::Queue,
        "skip" => OperatorCommand::Skip,
        "ended" => return Ok(Some(AppEvent::PlayerEnded)),
        "y" | "yes" => OperatorCommand::Answer(true),
        "n" | "no" => OperatorCommand::Answer(false),
        "status" => OperatorCommand::Status,
        "reconnect" => OperatorCommand::Reconnect,
        "quit" | "exit" => OperatorCommand::Quit,
        "help" | "?" => return Err(HELP.to_string()),
        other => return Err(format!("unknown command '{}', try 'help'", other)),
    };

    Ok(Some(AppEvent::Command(command)))
}

/// Format a notice for the terminal
pub fn render(notice: &Notice) -> String {
    match notice {
        Notice::Connection(state) => format!("[{}]", state),
        Notice::Queue { items, cursor } if items.is_empty() => {
            format!("Queue is empty (position {})", cursor + 1)
        }
        Notice::Queue { items, cursor } => {
            let mut out = String::from("Queue:");
            for (i, item) in items.iter().enumerate() {
                let marker = if i == *cursor { ">" } else { " " };
                out.push_str(&format!("\n {} {:>2}. {} ({})", marker, i + 1, item.title, item.id));
            }
            out
        }
        Notice::Results(results) if results.is_empty() => "No results".to_string(),
        Notice::Results(results) => {
            let mut out = String::from("Results:");
            for (i, result) in results.iter().enumerate() {
                out.push_str(&format!("\n  {:>2}. {} ({})", i + 1, result.title, result.video_id));
            }
            out
        }
        Notice::Prompt(text) => text.clone(),
        Notice::Info(text) => text.clone(),
        Notice::Error(text) => format!("error: {}", text),
    }
}

pub struct TerminalPlayer {
    loaded: Option<String>,
}

impl MediaPlayer for TerminalPlayer {
    fn load(&mut self, video_id: &str) {
        info!(video_id = %video_id, "Player loading");
        println!("Now playing: {}", video_id);
        self.loaded = Some(video_id.to_string());
    }

    fn loaded_id(&self) -> Option<&str> {
        self.loaded.as_deref()
    }
}

pub struct TerminalPlayerFactory;

impl PlayerFactory for TerminalPlayerFactory {
    fn create(&mut self, video_id: &str) -> Box<dyn MediaPlayer> {
        let mut player = TerminalPlayer { loaded: None };
        player.load(video_id);
        Box::new(player)
    }
}
