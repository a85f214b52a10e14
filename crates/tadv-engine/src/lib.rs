//! Story engine for tadv.
//!
//! Renders scenes against live game state, resolves choices, follows
//! `@goto` transitions between scenes and stories, and wires undo and save
//! files into a single [`Engine`] that presentation layers drive.

/// Action handlers invoked by choices.
pub mod actions;
/// Character templates.
pub mod characters;
/// Text commands such as `save` and `undo`.
pub mod commands;
/// Engine configuration.
pub mod config;
/// Expression scope over a game state.
pub mod context;
/// The engine itself.
pub mod engine;
/// Error types for the engine.
pub mod error;
/// Conditional blocks, interpolation, and inline choices.
pub mod template;

pub use actions::{ActionRegistry, NOTHING_HAPPENS, UNDO_ACTION};
pub use characters::{CharacterTemplate, build_character};
pub use commands::{TextCommand, parse_text_command, suggest_command};
pub use config::EngineConfig;
pub use context::{EvalContext, sanitize_name};
pub use engine::{Engine, SceneView, Story, StoryInfo};
pub use error::{EngineError, EngineResult};
pub use template::{Rendered, TemplateProcessor};
