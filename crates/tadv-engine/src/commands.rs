//! Text commands typed at the prompt instead of a choice number.

use strsim::jaro_winkler;
use tadv_save::SaveSummary;

use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};

/// Minimum similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

const HELP_VERBS: &[&str] = &["help"];
const UNDO_VERBS: &[&str] = &["undo"];
const SAVE_VERBS: &[&str] = &["save"];
const LOAD_VERBS: &[&str] = &["load"];
const LIST_VERBS: &[&str] = &["saves", "list"];
const DELETE_VERBS: &[&str] = &["delete"];
const RESTART_VERBS: &[&str] = &["restart"];
const QUIT_VERBS: &[&str] = &["quit", "exit", "q"];

const HELP_TEXT: &str = "\
Available commands:
- help: Show this help message
- undo: Undo the last action
- save [name]: Save the game with optional name
- load [name]: Load a saved game, or list saves
- saves: List all saved games
- delete [name]: Delete a saved game
- restart: Start the story over
- quit: Exit the game";

/// A parsed text command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextCommand {
    /// Blank input.
    Empty,
    /// `help`
    Help,
    /// `undo`
    Undo,
    /// Save under a name, or `autosave_{day}`.
    Save(Option<String>),
    /// Load a save, or list saves when no name is given.
    Load(Option<String>),
    /// `saves` or `list`
    ListSaves,
    /// Delete the named save.
    Delete(Option<String>),
    /// Start the story over.
    Restart,
    /// `quit`, `exit` or `q`
    Quit,
    /// Any other verb, as typed.
    Unknown(String),
}

impl TextCommand {
    /// Whether the session should end after this command.
    pub fn is_quit(&self) -> bool {
        matches!(self, Self::Quit)
    }
}

/// Parse a line of input. The verb is case-insensitive; save names keep
/// their case.
pub fn parse_text_command(input: &str) -> TextCommand {
    let mut words = input.split_whitespace();
    let Some(verb) = words.next() else {
        return TextCommand::Empty;
    };
    let verb = verb.to_lowercase();
    let name = words.next().map(str::to_string);
    let verb = verb.as_str();

    if HELP_VERBS.contains(&verb) {
        TextCommand::Help
    } else if UNDO_VERBS.contains(&verb) {
        TextCommand::Undo
    } else if SAVE_VERBS.contains(&verb) {
        TextCommand::Save(name)
    } else if LOAD_VERBS.contains(&verb) {
        TextCommand::Load(name)
    } else if LIST_VERBS.contains(&verb) {
        TextCommand::ListSaves
    } else if DELETE_VERBS.contains(&verb) {
        TextCommand::Delete(name)
    } else if RESTART_VERBS.contains(&verb) {
        TextCommand::Restart
    } else if QUIT_VERBS.contains(&verb) {
        TextCommand::Quit
    } else {
        TextCommand::Unknown(verb.to_string())
    }
}

/// The closest known verb to `word`, if any is close enough.
pub fn suggest_command(word: &str) -> Option<&'static str> {
    [
        HELP_VERBS,
        UNDO_VERBS,
        SAVE_VERBS,
        LOAD_VERBS,
        LIST_VERBS,
        DELETE_VERBS,
        RESTART_VERBS,
        QUIT_VERBS,
    ]
    .into_iter()
    .flatten()
    .map(|verb| (*verb, jaro_winkler(word, verb)))
    .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
    .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    .map(|(verb, _)| verb)
}

fn format_saves(saves: &[SaveSummary]) -> String {
    saves
        .iter()
        .enumerate()
        .map(|(i, save)| {
            format!(
                "{}. {} ({}, {})",
                i + 1,
                save.name,
                save.timestamp.format("%Y-%m-%d %H:%M:%S"),
                save.title
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

impl Engine {
    /// Run a text command and return the message for the player.
    pub fn process_text_command(&mut self, input: &str) -> EngineResult<String> {
        self.execute_command(parse_text_command(input))
    }

    /// Run an already parsed command.
    pub fn execute_command(&mut self, command: TextCommand) -> EngineResult<String> {
        match command {
            TextCommand::Empty => Ok("Please enter a command.".to_string()),
            TextCommand::Help => Ok(HELP_TEXT.to_string()),
            TextCommand::Undo => self.undo(),
            TextCommand::Save(name) => {
                let name = match name {
                    Some(name) => name,
                    None => {
                        let day = self.state().ok_or(EngineError::NoActiveGame)?.day;
                        format!("autosave_{day}")
                    }
                };
                self.save(&name)
            }
            TextCommand::Load(Some(name)) => self.load(&name),
            TextCommand::Load(None) => {
                let saves = self.list_saves()?;
                if saves.is_empty() {
                    return Ok("No saved games found.".to_string());
                }
                Ok(format!(
                    "Available saves:\n{}\nUse 'load [name]' to load a specific save.",
                    format_saves(&saves)
                ))
            }
            TextCommand::ListSaves => {
                let saves = self.list_saves()?;
                if saves.is_empty() {
                    return Ok("No saved games found.".to_string());
                }
                Ok(format!("Available saves:\n{}", format_saves(&saves)))
            }
            TextCommand::Delete(Some(name)) => self.delete_save(&name),
            TextCommand::Delete(None) => Ok("Please specify a save name to delete.".to_string()),
            TextCommand::Restart => self.restart(),
            TextCommand::Quit => Ok("Goodbye!".to_string()),
            TextCommand::Unknown(command) => Err(EngineError::UnknownCommand {
                suggestion: suggest_command(&command).map(str::to_string),
                command,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_verbs_case_insensitively() {
        assert_eq!(parse_text_command("  "), TextCommand::Empty);
        assert_eq!(parse_text_command("HELP"), TextCommand::Help);
        assert_eq!(parse_text_command("Save Slot1"), TextCommand::Save(Some("Slot1".into())));
        assert_eq!(parse_text_command("load"), TextCommand::Load(None));
        assert_eq!(parse_text_command("list"), TextCommand::ListSaves);
        assert_eq!(parse_text_command("saves"), TextCommand::ListSaves);
        assert_eq!(parse_text_command("delete old"), TextCommand::Delete(Some("old".into())));
        assert!(parse_text_command("Q").is_quit());
        assert!(parse_text_command("exit").is_quit());
        assert_eq!(parse_text_command("dance now"), TextCommand::Unknown("dance".into()));
    }

    #[test]
    fn suggestions() {
        assert_eq!(suggest_command("sav"), Some("save"));
        assert_eq!(suggest_command("restrat"), Some("restart"));
        assert_eq!(suggest_command("helpp"), Some("help"));
        assert_eq!(suggest_command("xyzzy"), None);
    }
}
