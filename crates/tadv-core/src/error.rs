/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by the core data model.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The requested scene ID does not exist in the graph.
    #[error("scene not found: {0}")]
    SceneNotFound(String),

    /// No player or NPC carries the requested name.
    #[error("character not found: {0}")]
    CharacterNotFound(String),
}
