//! Engine configuration.

use std::path::{Path, PathBuf};

/// Where stories, character templates and saves live, plus play limits.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory searched for `<id>.tadv` story files.
    pub stories_dir: PathBuf,
    /// Directory for `Name@file` character templates.
    pub templates_dir: PathBuf,
    /// Directory for `.save` files.
    pub saves_dir: PathBuf,
    /// Undo steps kept in memory.
    pub history_size: usize,
    /// Start scene when neither the caller nor the story names one.
    pub default_start_scene: String,
    /// Longest chain of `@goto` jumps followed in one go.
    pub max_auto_transitions: usize,
}

/// A directory next to `dir`, e.g. `saves` beside `stories`.
fn sibling(dir: &Path, name: &str) -> PathBuf {
    match dir.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new("stories")
    }
}

impl EngineConfig {
    /// Configuration rooted at `stories_dir`, with templates and saves in
    /// sibling directories.
    pub fn new(stories_dir: impl Into<PathBuf>) -> Self {
        let stories_dir = stories_dir.into();
        Self {
            templates_dir: sibling(&stories_dir, "templates"),
            saves_dir: sibling(&stories_dir, "saves"),
            stories_dir,
            history_size: 50,
            default_start_scene: "start".to_string(),
            max_auto_transitions: 16,
        }
    }

    /// Set the templates directory.
    pub fn with_templates_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.templates_dir = dir.into();
        self
    }

    /// Set the saves directory.
    pub fn with_saves_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.saves_dir = dir.into();
        self
    }

    /// Set the undo depth.
    pub fn with_history_size(mut self, size: usize) -> Self {
        self.history_size = size;
        self
    }

    /// Set the fallback start scene.
    pub fn with_default_start_scene(mut self, scene: impl Into<String>) -> Self {
        self.default_start_scene = scene.into();
        self
    }

    /// Set the auto-transition chain limit (at least 1).
    pub fn with_max_auto_transitions(mut self, max: usize) -> Self {
        self.max_auto_transitions = max.max(1);
        self
    }
}
