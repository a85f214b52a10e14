//! Persistence for tadv games.
//!
//! A [`GameStateSnapshot`] is the single serializable form of a game state.
//! The engine pushes snapshots onto an [`UndoHistory`] before every state
//! change and writes them to disk through a [`SaveStore`].

/// Error types for saves.
pub mod error;
/// Bounded undo stack.
pub mod history;
/// Serializable game state.
pub mod snapshot;
/// Save files on disk.
pub mod store;

pub use error::{SaveError, SaveResult};
pub use history::{HistoryEntry, UndoHistory};
pub use snapshot::GameStateSnapshot;
pub use store::{SaveRecord, SaveStore, SaveSummary};
