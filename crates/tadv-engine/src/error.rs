//! Error types for the story engine.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while loading or playing a story.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Neither a story id in the stories directory nor an existing path.
    #[error("Story not found: {0}")]
    StoryNotFound(String),

    /// An operation needs a loaded story.
    #[error("No story loaded.")]
    NoStoryLoaded,

    /// A scene referenced by id does not exist in the loaded story.
    #[error("Scene not found: {0}")]
    SceneNotFound(String),

    /// A character template file is missing or unreadable.
    #[error("character template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    /// A character template is not valid JSON of the expected shape.
    #[error("invalid character template {}: {source}", path.display())]
    InvalidTemplate {
        /// Template file.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// An operation needs a running game.
    #[error("No active game.")]
    NoActiveGame,

    /// A choice index outside the rendered list.
    #[error("Invalid choice {}: {available} choice(s) available", .index + 1)]
    InvalidChoice {
        /// Zero-based index requested.
        index: usize,
        /// Number of choices on offer.
        available: usize,
    },

    /// An action id that the engine handles itself.
    #[error("action id `{0}` is reserved")]
    ReservedAction(String),

    /// A text command that is not recognized.
    #[error("Unknown command: {command}{}", suggestion.as_ref().map(|s| format!(". Did you mean '{s}'?")).unwrap_or_default())]
    UnknownCommand {
        /// The command word as typed.
        command: String,
        /// A close match, if any.
        suggestion: Option<String>,
    },

    /// Story file loading failed.
    #[error(transparent)]
    Dsl(#[from] tadv_dsl::DslError),

    /// Save file access failed.
    #[error(transparent)]
    Save(#[from] tadv_save::SaveError),

    /// Scene lookup failed.
    #[error(transparent)]
    Core(#[from] tadv_core::CoreError),
}
