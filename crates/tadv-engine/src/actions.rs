//! Handlers that run when a choice names an action id.

use std::collections::HashMap;
use std::fmt;

use tadv_core::GameState;

use crate::error::{EngineError, EngineResult};

/// Action id the engine answers itself by undoing the last step.
pub const UNDO_ACTION: &str = "undo";

/// Result text for an action id with no handler.
pub const NOTHING_HAPPENS: &str = "Nothing happens.";

/// A registered action. Returns the text shown to the player.
pub type ActionFn = Box<dyn Fn(&mut GameState) -> String>;

/// Action handlers keyed by id.
#[derive(Default)]
pub struct ActionRegistry {
    actions: HashMap<String, ActionFn>,
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("ActionRegistry").field("actions", &ids).finish()
    }
}

impl ActionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `id`, replacing any earlier handler.
    pub fn register<F>(&mut self, id: impl Into<String>, handler: F) -> EngineResult<()>
    where
        F: Fn(&mut GameState) -> String + 'static,
    {
        let id = id.into();
        if id == UNDO_ACTION {
            return Err(EngineError::ReservedAction(id));
        }
        if self.actions.insert(id.clone(), Box::new(handler)).is_some() {
            tracing::debug!(action = %id, "replaced action handler");
        }
        Ok(())
    }

    /// Whether a handler is registered under `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.actions.contains_key(id)
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Run the handler for `id`. Unknown ids leave the state untouched.
    pub fn run(&self, id: &str, state: &mut GameState) -> String {
        match self.actions.get(id) {
            Some(handler) => {
                tracing::debug!(action = id, "running action");
                handler(state)
            }
            None => {
                tracing::warn!(action = id, "no handler registered");
                NOTHING_HAPPENS.to_string()
            }
        }
    }
}
