//! Core types for tadv: values, characters, game state, and the scene graph.
//!
//! This crate holds the data model that story files are parsed into and that
//! the engine mutates during play. It does no I/O and knows nothing about the
//! story text format or the expression language.

/// Player and NPC records with an open attribute bag.
pub mod character;
/// Error types used throughout the crate.
pub mod error;
/// Scenes, choices, and the scene graph.
pub mod scene;
/// Mutable game state and the day/time cycle.
pub mod state;
/// Dynamically typed values for stats and variables.
pub mod value;

pub use character::{CLAMPED_STATS, Character};
pub use error::{CoreError, CoreResult};
pub use scene::{AutoTransition, Choice, Scene, SceneGraph};
pub use state::{GameState, TimeOfDay};
pub use value::Value;
