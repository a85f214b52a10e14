//! Story language front end: the `.tadv` file parser, import resolution,
//! structural validation, and the expression language used by templates
//! and choice conditions.

/// Choice line grammar.
pub mod choice;
/// Diagnostics and their ariadne rendering.
pub mod diagnostics;
/// Error types for loading stories.
pub mod error;
pub mod expr;
/// Loading a story with its imports.
pub mod loader;
/// The story file parser.
pub mod story;
/// Scene graph checks.
pub mod validate;

pub use choice::{ChoiceSyntaxError, is_choice_line, parse_choice_line};
pub use diagnostics::{Diagnostic, Severity, render_diagnostics};
pub use error::{DslError, DslResult};
pub use loader::{LoadedStory, SourceFile, load_story_file};
pub use story::{CharacterDecl, ParseMode, StoryDocument, parse_goto, parse_into, parse_story};
pub use validate::{ValidationIssue, validate};
