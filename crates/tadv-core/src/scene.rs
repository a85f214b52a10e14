use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// A player-selectable option.
///
/// The same shape is produced for choices declared in the story source and
/// for choices extracted from rendered scene text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Text shown to the player.
    pub text: String,
    /// Registered action to run when chosen.
    pub action_id: Option<String>,
    /// Scene to move to.
    pub next_scene: Option<String>,
    /// Runtime condition expression.
    pub condition: Option<String>,
    /// Story to switch to.
    pub next_story: Option<String>,
    /// Scene to move to when `condition` is false.
    pub alternate_scene: Option<String>,
}

impl Choice {
    /// Create a choice with only display text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Set the action identifier.
    pub fn with_action(mut self, action_id: impl Into<String>) -> Self {
        self.action_id = Some(action_id.into());
        self
    }

    /// Set the target scene.
    pub fn with_target(mut self, scene_id: impl Into<String>) -> Self {
        self.next_scene = Some(scene_id.into());
        self
    }

    /// Set the runtime condition.
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Set the target story.
    pub fn with_story(mut self, story_id: impl Into<String>) -> Self {
        self.next_story = Some(story_id.into());
        self
    }

    /// Set the fallback scene used when the condition is false.
    pub fn with_alternate(mut self, scene_id: impl Into<String>) -> Self {
        self.alternate_scene = Some(scene_id.into());
        self
    }

    /// Scene IDs this choice can lead to within the current story.
    pub fn local_targets(&self) -> impl Iterator<Item = &str> {
        let local = if self.next_story.is_none() {
            self.next_scene.as_deref()
        } else {
            None
        };
        local.into_iter().chain(self.alternate_scene.as_deref())
    }
}

/// An unconditional jump to another scene, with optional display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoTransition {
    /// Scene to move to.
    pub target: String,
    /// Text shown when the jump happens.
    pub text: Option<String>,
}

/// A named unit of narrative content plus its declared choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    /// Unique key.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Raw, unrendered body text. May contain template syntax.
    pub content: String,
    /// Statically declared choices in source order.
    pub choices: Vec<Choice>,
    /// Jump declared by a structural `@goto` directive.
    pub auto_transition: Option<AutoTransition>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: String::new(),
            choices: Vec::new(),
            auto_transition: None,
        }
    }
}

/// Scenes of one story, kept in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneGraph {
    scenes: Vec<Scene>,
    index: HashMap<String, usize>,
}

impl SceneGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scene. A scene with the same ID is replaced in place and returned.
    pub fn insert(&mut self, scene: Scene) -> Option<Scene> {
        match self.index.get(&scene.id) {
            Some(&i) => Some(std::mem::replace(&mut self.scenes[i], scene)),
            None => {
                self.index.insert(scene.id.clone(), self.scenes.len());
                self.scenes.push(scene);
                None
            }
        }
    }

    /// Look up a scene by ID.
    pub fn get(&self, id: &str) -> Option<&Scene> {
        self.index.get(id).map(|&i| &self.scenes[i])
    }

    /// Look up a scene by ID, failing when it is missing.
    pub fn require(&self, id: &str) -> CoreResult<&Scene> {
        self.get(id)
            .ok_or_else(|| CoreError::SceneNotFound(id.to_string()))
    }

    /// Whether a scene with `id` exists.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Number of scenes.
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    /// Whether the graph has no scenes.
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Scenes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.iter()
    }

    /// Total number of statically declared choices.
    pub fn choice_count(&self) -> usize {
        self.scenes.iter().map(|s| s.choices.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(id: &str, targets: &[&str]) -> Scene {
        let mut s = Scene::new(id, id.to_uppercase());
        for t in targets {
            s.choices.push(Choice::new(format!("to {t}")).with_target(*t));
        }
        s
    }

    #[test]
    fn insert_and_lookup() {
        let mut graph = SceneGraph::new();
        assert!(graph.insert(scene("start", &["forest"])).is_none());
        graph.insert(scene("forest", &[]));
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.get("start").unwrap().title, "START");
        assert!(graph.require("cave").is_err());
        assert_eq!(graph.choice_count(), 1);
    }

    #[test]
    fn duplicate_replaces_in_place() {
        let mut graph = SceneGraph::new();
        graph.insert(scene("a", &[]));
        graph.insert(scene("b", &[]));
        let old = graph.insert(Scene::new("a", "Again"));
        assert_eq!(old.unwrap().title, "A");
        let ids: Vec<_> = graph.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(graph.get("a").unwrap().title, "Again");
    }

    #[test]
    fn cross_story_targets_are_not_local() {
        let choice = Choice::new("Leave").with_story("city").with_target("gate");
        assert_eq!(choice.local_targets().count(), 0);
        let choice = Choice::new("Try")
            .with_target("win")
            .with_condition("energy > 20")
            .with_alternate("lose");
        let targets: Vec<_> = choice.local_targets().collect();
        assert_eq!(targets, vec!["win", "lose"]);
    }
}
