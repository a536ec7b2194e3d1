use colored::Colorize;

use crate::api::Note;
use crate::error::InkpadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Pretty,
    Json,
}

impl OutputMode {
    pub fn from_flag(json: bool) -> Self {
        if json {
            OutputMode::Json
        } else {
            OutputMode::Pretty
        }
    }
}

pub fn is_tty() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stdout())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn dim(text: &str, is_tty: bool) -> String {
    if is_tty {
        text.dimmed().to_string()
    } else {
        text.to_string()
    }
}

pub fn print_notes(notes: &[Note], mode: OutputMode, is_tty: bool) {
    match mode {
        OutputMode::Json => print_json(notes),
        OutputMode::Pretty => {
            if notes.is_empty() {
                println!("No notes.");
                return;
            }
            for note in notes {
                println!("{}  {}", dim(&note.id, is_tty), note.title);
            }
        }
    }
}

pub fn print_note(note: &Note, mode: OutputMode, is_tty: bool) {
    match mode {
        OutputMode::Json => print_json(note),
        OutputMode::Pretty => {
            let title = if is_tty {
                note.title.bold().to_string()
            } else {
                note.title.clone()
            };
            println!("{title}");
            println!("  {}: {}", dim("id", is_tty), note.id);
            if let Some(updated) = note.updated_at.as_deref().or(note.created_at.as_deref()) {
                println!("  {}: {}", dim("updated", is_tty), updated);
            }
            if !note.content.is_empty() {
                println!();
                println!("{}", note.content);
            }
        }
    }
}

/// Untyped payloads (files, recycle bin, acknowledgements).
pub fn print_value(value: &serde_json::Value, mode: OutputMode) {
    match (mode, value) {
        (OutputMode::Pretty, serde_json::Value::Null) => println!("Done."),
        (OutputMode::Pretty, serde_json::Value::String(s)) => println!("{s}"),
        _ => print_json(value),
    }
}

/// A one-line status: plain text, or `{"message": ...}` in JSON mode.
pub fn print_message(message: &str, mode: OutputMode) {
    match mode {
        OutputMode::Json => print_json(&serde_json::json!({ "message": message })),
        OutputMode::Pretty => println!("{message}"),
    }
}

pub fn print_error(err: &InkpadError, json_mode: bool) {
    if json_mode {
        print_json(&err.to_json());
    } else if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        eprintln!("{}: {err}", "Error".red().bold());
    } else {
        eprintln!("Error: {err}");
    }
}
