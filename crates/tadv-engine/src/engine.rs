//! The engine: one loaded story, one game state, and the moves between
//! scenes.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tadv_core::{AutoTransition, Character, Choice, GameState};
use tadv_dsl::expr::eval_condition;
use tadv_dsl::{StoryDocument, load_story_file, parse_story};
use tadv_save::{GameStateSnapshot, HistoryEntry, SaveRecord, SaveStore, SaveSummary, UndoHistory};

use crate::actions::{ActionRegistry, UNDO_ACTION};
use crate::characters::build_character;
use crate::config::EngineConfig;
use crate::context::EvalContext;
use crate::error::{EngineError, EngineResult};
use crate::template::TemplateProcessor;

const STORY_EXTENSION: &str = "tadv";

/// A story file found in the stories directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryInfo {
    /// File stem.
    pub id: String,
    /// The `title` metadata, or the id.
    pub title: String,
    /// Story file.
    pub path: PathBuf,
}

/// A loaded story and where it came from.
#[derive(Debug, Clone)]
pub struct Story {
    /// File stem of the main story file.
    pub id: String,
    /// Main story file.
    pub path: PathBuf,
    /// Parsed story with imports merged.
    pub document: StoryDocument,
}

impl Story {
    /// The `title` metadata, or the id.
    pub fn title(&self) -> &str {
        self.document.title().unwrap_or(&self.id)
    }
}

/// A scene rendered against the current state.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneView {
    /// Id of the rendered scene.
    pub scene_id: String,
    /// Scene title.
    pub title: String,
    /// Content with conditionals, interpolation, and inline choices resolved.
    pub text: String,
    /// Static choices that passed their conditions, then choices found in
    /// the rendered text.
    pub choices: Vec<Choice>,
    /// A rendered `@goto` wins over the scene's own.
    pub auto_transition: Option<AutoTransition>,
}

impl SceneView {
    /// A scene with nothing to choose and nowhere to go ends the story.
    pub fn is_ending(&self) -> bool {
        self.choices.is_empty() && self.auto_transition.is_none()
    }
}

/// Runs a story.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    templates: TemplateProcessor,
    actions: ActionRegistry,
    saves: SaveStore,
    history: UndoHistory,
    story: Option<Story>,
    state: Option<GameState>,
    /// Rendered views by scene id. Cleared whenever the state may have changed.
    cache: HashMap<String, SceneView>,
}

impl Engine {
    /// Create an engine with no story loaded.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            templates: TemplateProcessor::new(),
            actions: ActionRegistry::new(),
            saves: SaveStore::new(config.saves_dir.clone()),
            history: UndoHistory::new(config.history_size),
            story: None,
            state: None,
            cache: HashMap::new(),
            config,
        }
    }

    /// Configuration the engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The loaded story, if any.
    pub fn story(&self) -> Option<&Story> {
        self.story.as_ref()
    }

    /// The running game, if one was initialized.
    pub fn state(&self) -> Option<&GameState> {
        self.state.as_ref()
    }

    /// Mutable access to the game state. Drops every cached render.
    pub fn state_mut(&mut self) -> Option<&mut GameState> {
        self.cache.clear();
        self.state.as_mut()
    }

    /// Number of undo snapshots held.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Register an action handler. `undo` is reserved.
    pub fn register_action<F>(&mut self, id: impl Into<String>, handler: F) -> EngineResult<()>
    where
        F: Fn(&mut GameState) -> String + 'static,
    {
        self.actions.register(id, handler)
    }

    /// Story files in the stories directory, sorted by id.
    pub fn stories(&self) -> EngineResult<Vec<StoryInfo>> {
        let dir = &self.config.stories_dir;
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(dir).map_err(|source| tadv_dsl::DslError::Io {
            path: dir.clone(),
            source,
        })?;
        let mut stories = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(STORY_EXTENSION) {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let title = match fs::read_to_string(&path) {
                Ok(source) => parse_story(&source).0.title().map(str::to_string),
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "skipping unreadable story");
                    continue;
                }
            };
            stories.push(StoryInfo {
                id: id.to_string(),
                title: title.unwrap_or_else(|| id.to_string()),
                path,
            });
        }
        stories.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(stories)
    }

    /// Find a story by id in the stories directory, or by path.
    fn locate(&self, id_or_path: &str) -> EngineResult<(String, PathBuf)> {
        let in_dir = self
            .config
            .stories_dir
            .join(format!("{id_or_path}.{STORY_EXTENSION}"));
        if in_dir.is_file() {
            return Ok((id_or_path.to_string(), in_dir));
        }
        let path = Path::new(id_or_path);
        if path.is_file()
            && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
        {
            return Ok((stem.to_string(), path.to_path_buf()));
        }
        Err(EngineError::StoryNotFound(id_or_path.to_string()))
    }

    fn prepare_story(&self, id_or_path: &str) -> EngineResult<Story> {
        let (id, path) = self.locate(id_or_path)?;
        self.read_story(id, path)
    }

    fn read_story(&self, id: String, path: PathBuf) -> EngineResult<Story> {
        let loaded = load_story_file(&path)?;
        for (file, diagnostic) in loaded.diagnostics() {
            tracing::warn!(
                file = %file.path.display(),
                line = diagnostic.line_number(&file.source),
                "{diagnostic}"
            );
        }
        Ok(Story {
            id,
            path,
            document: loaded.document,
        })
    }

    /// Load a story by id or path. Nothing changes if loading fails.
    pub fn load_story(&mut self, id_or_path: &str) -> EngineResult<()> {
        let story = self.prepare_story(id_or_path)?;
        tracing::info!(story = %story.id, scenes = story.document.scenes.len(), "story loaded");
        self.story = Some(story);
        self.cache.clear();
        Ok(())
    }

    fn current_story(&self) -> EngineResult<&Story> {
        self.story.as_ref().ok_or(EngineError::NoStoryLoaded)
    }

    fn current_state(&self) -> EngineResult<&GameState> {
        self.state.as_ref().ok_or(EngineError::NoActiveGame)
    }

    /// The player: named after `player_name`, else the declared player,
    /// else `Player`.
    fn build_player(&self, story: &Story, player_name: Option<&str>) -> EngineResult<Character> {
        let decl = story
            .document
            .characters
            .iter()
            .find(|d| d.is_player() || Some(d.name.as_str()) == player_name);
        match decl {
            Some(decl) => {
                let name = player_name.unwrap_or(&decl.name);
                build_character(decl, name, true, &self.config.templates_dir)
            }
            None => Ok(Character::new(player_name.unwrap_or("Player"), true)),
        }
    }

    fn build_state(
        &self,
        story: &Story,
        player_name: Option<&str>,
        starting_scene: Option<&str>,
        kept_player: Option<Character>,
    ) -> EngineResult<GameState> {
        let player = match kept_player {
            Some(player) => player,
            None => self.build_player(story, player_name)?,
        };

        let scene_id = starting_scene
            .or(story.document.start_scene())
            .unwrap_or(self.config.default_start_scene.as_str())
            .to_string();
        if !story.document.scenes.contains(&scene_id) {
            return Err(EngineError::SceneNotFound(scene_id));
        }

        let mut npcs = Vec::new();
        for decl in &story.document.characters {
            if decl.is_player() || decl.name == player.name {
                continue;
            }
            npcs.push(build_character(
                decl,
                &decl.name,
                false,
                &self.config.templates_dir,
            )?);
        }

        let mut state = GameState::new(scene_id, player);
        for npc in npcs {
            state.add_npc(npc);
        }
        Ok(state)
    }

    /// Start a game in the loaded story.
    ///
    /// With `keep_player`, the current player carries over unchanged.
    pub fn initialize_game(
        &mut self,
        player_name: Option<&str>,
        starting_scene: Option<&str>,
        keep_player: bool,
    ) -> EngineResult<()> {
        let story = self.current_story()?;
        let kept = if keep_player {
            self.state.as_ref().map(|s| s.player.clone())
        } else {
            None
        };
        let state = self.build_state(story, player_name, starting_scene, kept)?;
        tracing::info!(
            story = %story.id,
            scene = %state.current_scene_id,
            player = %state.player.name,
            "game started"
        );
        self.state = Some(state);
        self.cache.clear();
        Ok(())
    }

    /// Move to another story, keeping the player. Nothing changes if the
    /// story cannot be loaded or the scene does not exist.
    pub fn transition_to_story(&mut self, story_id: &str, scene: Option<&str>) -> EngineResult<()> {
        let player = self.current_state()?.player.clone();
        let story = self.prepare_story(story_id)?;
        let state = self.build_state(&story, None, scene, Some(player))?;
        tracing::info!(
            from = self.story.as_ref().map_or("", |s| s.id.as_str()),
            to = %story.id,
            scene = %state.current_scene_id,
            "story transition"
        );
        self.story = Some(story);
        self.state = Some(state);
        self.cache.clear();
        Ok(())
    }

    /// Apply a choice condition. A choice with an alternate scene is
    /// redirected instead of dropped.
    fn resolve_choice(&self, mut choice: Choice, ctx: &EvalContext<'_>) -> Option<Choice> {
        let Some(condition) = choice.condition.take() else {
            return Some(choice);
        };
        let passed = eval_condition(&condition, ctx).unwrap_or_else(|error| {
            tracing::warn!(%condition, %error, "choice condition failed; treating as false");
            false
        });
        match (passed, choice.alternate_scene.take()) {
            (true, _) => Some(choice),
            (false, Some(alternate)) => {
                choice.next_scene = Some(alternate);
                Some(choice)
            }
            (false, None) => None,
        }
    }

    fn render_scene(&self) -> EngineResult<SceneView> {
        let story = self.current_story()?;
        let state = self.current_state()?;
        let scene = story.document.scenes.require(&state.current_scene_id)?;
        let ctx = EvalContext::new(state);

        let rendered = self.templates.render(&scene.content, &ctx);

        let mut choices: Vec<Choice> = scene
            .choices
            .iter()
            .filter_map(|choice| self.resolve_choice(choice.clone(), &ctx))
            .map(|mut choice| {
                choice.text = self.templates.render_text(&choice.text, &ctx);
                choice
            })
            .collect();
        choices.extend(
            rendered
                .choices
                .into_iter()
                .filter_map(|choice| self.resolve_choice(choice, &ctx)),
        );

        tracing::debug!(scene = %scene.id, choices = choices.len(), "rendered scene");
        Ok(SceneView {
            scene_id: scene.id.clone(),
            title: scene.title.clone(),
            text: rendered.text,
            choices,
            auto_transition: rendered
                .auto_transition
                .or_else(|| scene.auto_transition.clone()),
        })
    }

    /// The current scene rendered against the current state, cached until
    /// the state changes.
    pub fn current_scene_view(&mut self) -> EngineResult<&SceneView> {
        let scene_id = self.current_state()?.current_scene_id.clone();
        if !self.cache.contains_key(&scene_id) {
            let view = self.render_scene()?;
            self.cache.insert(scene_id.clone(), view);
        } else {
            tracing::debug!(scene = %scene_id, "render cache hit");
        }
        self.cache
            .get(&scene_id)
            .ok_or(EngineError::SceneNotFound(scene_id))
    }

    /// Rendered text of the current scene.
    pub fn current_scene_text(&mut self) -> EngineResult<String> {
        Ok(self.current_scene_view()?.text.clone())
    }

    /// Labels of the choices available in the current scene.
    pub fn choice_texts(&mut self) -> EngineResult<Vec<String>> {
        Ok(self
            .current_scene_view()?
            .choices
            .iter()
            .map(|c| c.text.clone())
            .collect())
    }

    fn push_history(&mut self) -> EngineResult<()> {
        let story = self.current_story()?;
        let (story_id, story_path) = (story.id.clone(), story.path.clone());
        let state = GameStateSnapshot::from(self.current_state()?);
        self.history.push(HistoryEntry {
            story_id,
            story_path,
            state,
        });
        Ok(())
    }

    fn require_scene(&self, scene_id: &str) -> EngineResult<()> {
        if self.current_story()?.document.scenes.contains(scene_id) {
            Ok(())
        } else {
            Err(EngineError::SceneNotFound(scene_id.to_string()))
        }
    }

    /// Take the choice at zero-based `index` in the current view.
    pub fn handle_choice(&mut self, index: usize) -> EngineResult<String> {
        let view = self.current_scene_view()?;
        let available = view.choices.len();
        let choice = view
            .choices
            .get(index)
            .cloned()
            .ok_or(EngineError::InvalidChoice { index, available })?;

        if choice.action_id.as_deref() == Some(UNDO_ACTION) {
            return self.undo();
        }
        if choice.next_story.is_none()
            && let Some(target) = &choice.next_scene
        {
            self.require_scene(target)?;
        }

        self.push_history()?;
        self.cache.clear();

        if let Some(story_id) = &choice.next_story
            && let Err(error) = self.transition_to_story(story_id, choice.next_scene.as_deref())
        {
            self.history.pop();
            tracing::warn!(story = %story_id, %error, "story transition failed");
            return Err(error);
        }

        let state = self.state.as_mut().ok_or(EngineError::NoActiveGame)?;
        let result = match choice.action_id.as_deref() {
            Some(id) => Some(self.actions.run(id, state)),
            None => None,
        };
        if choice.next_story.is_none()
            && let Some(target) = &choice.next_scene
        {
            state.change_scene(target.as_str());
        }
        tracing::debug!(choice = %choice.text, scene = %state.current_scene_id, "choice taken");

        Ok(result
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| "You made your choice.".to_string()))
    }

    /// Follow the current scene's `@goto`, if it has one.
    ///
    /// Returns the transition taken, whose text is shown before the next
    /// scene. A `@goto` to a scene that does not exist is logged and not
    /// taken, so the scene's choices stay available.
    pub fn follow_auto_transition(&mut self) -> EngineResult<Option<AutoTransition>> {
        let Some(auto) = self.current_scene_view()?.auto_transition.clone() else {
            return Ok(None);
        };
        if let Err(error) = self.require_scene(&auto.target) {
            tracing::warn!(target_scene = %auto.target, %error, "ignoring auto transition");
            return Ok(None);
        }
        self.push_history()?;
        self.cache.clear();
        let state = self.state.as_mut().ok_or(EngineError::NoActiveGame)?;
        state.change_scene(auto.target.as_str());
        tracing::debug!(scene = %auto.target, "auto transition");
        Ok(Some(auto))
    }

    /// Restore the state before the last choice.
    pub fn undo(&mut self) -> EngineResult<String> {
        let Some(entry) = self.history.pop() else {
            return Ok("Nothing to undo.".to_string());
        };

        let story = match &self.story {
            Some(story) if story.path == entry.story_path => None,
            _ => match self.read_story(entry.story_id.clone(), entry.story_path.clone()) {
                Ok(story) => Some(story),
                Err(error) => {
                    self.history.push(entry);
                    return Err(error);
                }
            },
        };

        if let Some(story) = story {
            self.story = Some(story);
        }
        self.state = Some(entry.state.restore());
        self.cache.clear();
        tracing::debug!(remaining = self.history.len(), "undo");
        Ok("Previous state restored.".to_string())
    }

    /// Advance the clock one period.
    pub fn advance_time(&mut self) -> EngineResult<()> {
        let state = self.state.as_mut().ok_or(EngineError::NoActiveGame)?;
        state.advance_time();
        self.cache.clear();
        Ok(())
    }

    /// Start the loaded story over, keeping the player's name.
    pub fn restart(&mut self) -> EngineResult<String> {
        let name = self.current_state()?.player.name.clone();
        self.initialize_game(Some(&name), None, false)?;
        Ok("Game restarted.".to_string())
    }

    /// Write the current game to the save directory under `name`.
    pub fn save(&self, name: &str) -> EngineResult<String> {
        let story = self.current_story()?;
        let state = self.current_state()?;
        let record = SaveRecord::new(&story.id, story.title(), GameStateSnapshot::from(state));
        self.saves.save(name, &record)?;
        Ok(format!("Game saved as '{name}'."))
    }

    /// Restore a save, loading its story if another one is current.
    /// Nothing changes if the save or its story cannot be loaded.
    pub fn load(&mut self, name: &str) -> EngineResult<String> {
        let record = self.saves.load(name)?;
        let story = match &self.story {
            Some(story) if story.id == record.story_id => None,
            _ => Some(self.prepare_story(&record.story_id)?),
        };
        let state = record.state.restore();
        let target = story
            .as_ref()
            .or(self.story.as_ref())
            .ok_or(EngineError::NoStoryLoaded)?;
        if !target.document.scenes.contains(&state.current_scene_id) {
            return Err(EngineError::SceneNotFound(state.current_scene_id));
        }

        if let Some(story) = story {
            self.story = Some(story);
        }
        tracing::info!(save = name, story = %record.story_id, "game loaded");
        self.state = Some(state);
        self.cache.clear();
        Ok(format!("Game loaded from '{name}'."))
    }

    /// Saves in the save directory, newest first.
    pub fn list_saves(&self) -> EngineResult<Vec<SaveSummary>> {
        Ok(self.saves.list()?)
    }

    /// Remove a save file.
    pub fn delete_save(&self, name: &str) -> EngineResult<String> {
        self.saves.delete(name)?;
        Ok(format!("Save '{name}' deleted."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tadv_core::Value;
    use tempfile::TempDir;

    const GYM: &str = "\
=== metadata ===
title: Gym Day
start: lobby

=== characters ===
- Alex
    is_player: true
    energy: 80
- Coach Kim@coach
    patience: 30

=== scenes ===
---lobby: Lobby
Hello {{ player.name }}. Energy {{ player.energy }}.
{% if CoachKim.patience > 50 %}
The coach smiles.
{% else %}
The coach frowns.
{% endif %}
* Lift -> lift goto:weights if energy > 50
* Rest -> goto:bench if energy > 90 else goto:locker
* Sneak out -> goto:street if energy < 10
* Leave town -> story:city:plaza
* Take it back -> undo
{% if energy > 50 %}
* Sprint -> goto:track
{% endif %}

---weights: Weights
You lift. Energy {{ player.energy }}.
* Back -> goto:lobby
* Vanish -> story:nowhere

---bench: Bench
Resting.

---locker: Locker
@goto:street You head outside.

---street: Street
The end of the road.

---track: Track
Fast.
";

    const CITY: &str = "\
=== metadata ===
title: City
start: gate

=== scenes ===
---gate: Gate
City gate.

---plaza: Plaza
Welcome to the plaza, {{ player.name }}.
* Return -> story:gym:lobby
";

    struct Fixture {
        _dir: TempDir,
        engine: Engine,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let stories = dir.path().join("stories");
        let templates = dir.path().join("templates");
        fs::create_dir_all(&stories).unwrap();
        fs::create_dir_all(&templates).unwrap();
        fs::write(stories.join("gym.tadv"), GYM).unwrap();
        fs::write(stories.join("city.tadv"), CITY).unwrap();
        fs::write(
            templates.join("coach.tchar"),
            r#"{"stats": {"patience": 60, "expertise": 90}, "inventory": ["whistle"]}"#,
        )
        .unwrap();

        let mut engine = Engine::new(EngineConfig::new(stories));
        engine.load_story("gym").unwrap();
        engine.initialize_game(None, None, false).unwrap();
        Fixture { _dir: dir, engine }
    }

    fn lift(state: &mut GameState) -> String {
        state.player.adjust_stat("energy", -30.0);
        "You lift.".to_string()
    }

    fn scene(engine: &Engine) -> &str {
        &engine.state().unwrap().current_scene_id
    }

    #[test]
    fn lists_stories() {
        let Fixture { engine, _dir } = fixture();
        let stories = engine.stories().unwrap();
        let listed: Vec<_> = stories.iter().map(|s| (s.id.as_str(), s.title.as_str())).collect();
        assert_eq!(listed, vec![("city", "City"), ("gym", "Gym Day")]);
    }

    #[test]
    fn initializes_player_and_npcs() {
        let Fixture { engine, _dir } = fixture();
        let state = engine.state().unwrap();
        assert_eq!(state.current_scene_id, "lobby");
        assert_eq!(state.player.name, "Alex");
        assert_eq!(state.player.stat("energy"), &Value::Integer(80));
        assert!(!state.player.has_stat("is_player"));

        let coach = &state.npcs["Coach Kim"];
        assert_eq!(coach.stat("patience"), &Value::Integer(30));
        assert_eq!(coach.stat("expertise"), &Value::Integer(90));
        assert_eq!(coach.inventory, vec![Value::from("whistle")]);
    }

    #[test]
    fn player_name_override_keeps_declared_stats() {
        let Fixture { mut engine, _dir } = fixture();
        engine.initialize_game(Some("Sam"), None, false).unwrap();
        let state = engine.state().unwrap();
        assert_eq!(state.player.name, "Sam");
        assert_eq!(state.player.stat("energy"), &Value::Integer(80));
        assert_eq!(state.npcs.len(), 1);
    }

    #[test]
    fn renders_text_and_merges_choices() {
        let Fixture { mut engine, _dir } = fixture();
        assert_eq!(
            engine.current_scene_text().unwrap(),
            "Hello Alex. Energy 80.\nThe coach frowns."
        );
        assert_eq!(
            engine.choice_texts().unwrap(),
            vec!["Lift", "Rest", "Leave town", "Take it back", "Sprint"]
        );
        let view = engine.current_scene_view().unwrap();
        assert_eq!(view.choices[1].next_scene.as_deref(), Some("locker"));
        assert!(view.choices.iter().all(|c| c.condition.is_none()));
    }

    #[test]
    fn state_changes_invalidate_the_render_cache() {
        let Fixture { mut engine, _dir } = fixture();
        assert_eq!(engine.choice_texts().unwrap().len(), 5);
        engine.state_mut().unwrap().player.set_stat("energy", 5);
        assert_eq!(
            engine.choice_texts().unwrap(),
            vec!["Rest", "Sneak out", "Leave town", "Take it back"]
        );
    }

    #[test]
    fn choice_runs_action_then_moves() {
        let Fixture { mut engine, _dir } = fixture();
        engine.register_action("lift", lift).unwrap();
        assert_eq!(engine.handle_choice(0).unwrap(), "You lift.");
        assert_eq!(scene(&engine), "weights");
        assert!(engine.state().unwrap().has_visited("weights"));
        assert_eq!(engine.current_scene_text().unwrap(), "You lift. Energy 50.");
        assert_eq!(engine.history_len(), 1);
    }

    #[test]
    fn unknown_action_still_moves() {
        let Fixture { mut engine, _dir } = fixture();
        assert_eq!(engine.handle_choice(0).unwrap(), "Nothing happens.");
        assert_eq!(scene(&engine), "weights");
        assert_eq!(engine.state().unwrap().player.stat("energy"), &Value::Integer(80));
    }

    #[test]
    fn invalid_choice_changes_nothing() {
        let Fixture { mut engine, _dir } = fixture();
        let before = engine.state().unwrap().clone();
        let err = engine.handle_choice(9).unwrap_err();
        assert!(matches!(err, EngineError::InvalidChoice { index: 9, available: 5 }));
        assert_eq!(err.to_string(), "Invalid choice 10: 5 choice(s) available");
        assert_eq!(engine.state().unwrap(), &before);
        assert_eq!(engine.history_len(), 0);
    }

    #[test]
    fn undo_restores_previous_state() {
        let Fixture { mut engine, _dir } = fixture();
        engine.register_action("lift", lift).unwrap();
        engine.handle_choice(0).unwrap();
        assert_eq!(engine.undo().unwrap(), "Previous state restored.");
        assert_eq!(scene(&engine), "lobby");
        assert_eq!(engine.state().unwrap().player.stat("energy"), &Value::Integer(80));
        assert_eq!(engine.current_scene_text().unwrap(), "Hello Alex. Energy 80.\nThe coach frowns.");
        assert_eq!(engine.undo().unwrap(), "Nothing to undo.");
    }

    #[test]
    fn undo_choice_is_handled_by_the_engine() {
        let Fixture { mut engine, _dir } = fixture();
        assert_eq!(engine.handle_choice(3).unwrap(), "Nothing to undo.");
        assert_eq!(engine.history_len(), 0);
    }

    #[test]
    fn alternate_target_and_auto_transition() {
        let Fixture { mut engine, _dir } = fixture();
        assert_eq!(engine.handle_choice(1).unwrap(), "You made your choice.");
        assert_eq!(scene(&engine), "locker");

        let auto = engine.follow_auto_transition().unwrap().unwrap();
        assert_eq!(auto.target, "street");
        assert_eq!(auto.text.as_deref(), Some("You head outside."));
        assert_eq!(scene(&engine), "street");
        assert!(engine.current_scene_view().unwrap().is_ending());
        assert!(engine.follow_auto_transition().unwrap().is_none());
        assert_eq!(engine.history_len(), 2);
    }

    #[test]
    fn dangling_auto_transition_is_not_taken() {
        let Fixture { mut engine, _dir } = fixture();
        let path = engine.config().stories_dir.join("broken.tadv");
        fs::write(&path, "---start: Start\n@goto:missing Out.\n* Stay -> goto:start\n").unwrap();
        engine.load_story("broken").unwrap();
        engine.initialize_game(None, None, false).unwrap();

        assert!(engine.follow_auto_transition().unwrap().is_none());
        assert_eq!(scene(&engine), "start");
        assert_eq!(engine.history_len(), 0);
        assert_eq!(engine.choice_texts().unwrap(), vec!["Stay"]);
    }

    #[test]
    fn story_transition_keeps_player_and_undoes() {
        let Fixture { mut engine, _dir } = fixture();
        engine.state_mut().unwrap().set_variable("seen_gym", true);
        engine.handle_choice(2).unwrap();

        assert_eq!(engine.story().unwrap().id, "city");
        let state = engine.state().unwrap();
        assert_eq!(state.current_scene_id, "plaza");
        assert_eq!(state.player.stat("energy"), &Value::Integer(80));
        assert!(state.variable("seen_gym").is_none());
        assert_eq!(engine.current_scene_text().unwrap(), "Welcome to the plaza, Alex.");

        engine.undo().unwrap();
        assert_eq!(engine.story().unwrap().id, "gym");
        assert_eq!(scene(&engine), "lobby");
        assert_eq!(engine.state().unwrap().variable("seen_gym"), Some(&Value::Boolean(true)));
    }

    #[test]
    fn undo_reloads_story_loaded_by_path() {
        let Fixture { mut engine, _dir: dir } = fixture();
        let elsewhere = dir.path().join("elsewhere");
        fs::create_dir_all(&elsewhere).unwrap();
        let trail = elsewhere.join("trail.tadv");
        fs::write(&trail, "---start: Trailhead\n* Into town -> story:city:plaza\n").unwrap();

        engine.load_story(trail.to_str().unwrap()).unwrap();
        engine.initialize_game(None, None, false).unwrap();
        engine.handle_choice(0).unwrap();
        assert_eq!(engine.story().unwrap().id, "city");

        assert_eq!(engine.undo().unwrap(), "Previous state restored.");
        let story = engine.story().unwrap();
        assert_eq!(story.id, "trail");
        assert_eq!(story.path, trail);
        assert_eq!(scene(&engine), "start");
    }

    #[test]
    fn failed_story_transition_leaves_state() {
        let Fixture { mut engine, _dir } = fixture();
        engine.handle_choice(0).unwrap();
        let before = engine.state().unwrap().clone();

        let err = engine.handle_choice(1).unwrap_err();
        assert!(matches!(err, EngineError::StoryNotFound(ref id) if id == "nowhere"));
        assert_eq!(engine.state().unwrap(), &before);
        assert_eq!(engine.story().unwrap().id, "gym");
        assert_eq!(engine.history_len(), 1);
    }

    #[test]
    fn failed_loads_leave_state() {
        let Fixture { mut engine, _dir } = fixture();
        assert!(matches!(
            engine.load_story("missing"),
            Err(EngineError::StoryNotFound(_))
        ));
        assert!(matches!(
            engine.initialize_game(None, Some("nowhere"), false),
            Err(EngineError::SceneNotFound(_))
        ));
        assert_eq!(engine.story().unwrap().id, "gym");
        assert_eq!(scene(&engine), "lobby");
    }

    #[test]
    fn keep_player_across_initialization() {
        let Fixture { mut engine, _dir } = fixture();
        engine.state_mut().unwrap().player.set_stat("energy", 12);
        engine.initialize_game(None, Some("track"), true).unwrap();
        let state = engine.state().unwrap();
        assert_eq!(state.current_scene_id, "track");
        assert_eq!(state.player.stat("energy"), &Value::Integer(12));
    }

    #[test]
    fn save_load_and_delete() {
        let Fixture { mut engine, _dir } = fixture();
        assert_eq!(engine.save("slot").unwrap(), "Game saved as 'slot'.");
        engine.handle_choice(0).unwrap();
        assert_eq!(scene(&engine), "weights");

        assert_eq!(engine.load("slot").unwrap(), "Game loaded from 'slot'.");
        assert_eq!(scene(&engine), "lobby");

        let saves = engine.list_saves().unwrap();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].title, "Gym Day");

        assert_eq!(engine.delete_save("slot").unwrap(), "Save 'slot' deleted.");
        assert!(matches!(
            engine.load("slot"),
            Err(EngineError::Save(tadv_save::SaveError::NotFound(_)))
        ));
    }

    #[test]
    fn loading_a_save_from_another_story() {
        let Fixture { mut engine, _dir } = fixture();
        engine.handle_choice(2).unwrap();
        engine.save("city_save").unwrap();
        engine.load_story("gym").unwrap();
        engine.initialize_game(None, None, false).unwrap();

        engine.load("city_save").unwrap();
        assert_eq!(engine.story().unwrap().id, "city");
        assert_eq!(scene(&engine), "plaza");
    }

    #[test]
    fn text_commands() {
        let Fixture { mut engine, _dir } = fixture();
        assert_eq!(engine.process_text_command("").unwrap(), "Please enter a command.");
        assert!(engine.process_text_command("help").unwrap().starts_with("Available commands:"));
        assert_eq!(engine.process_text_command("load").unwrap(), "No saved games found.");

        assert_eq!(engine.process_text_command("SAVE").unwrap(), "Game saved as 'autosave_1'.");
        let listing = engine.process_text_command("saves").unwrap();
        assert!(listing.starts_with("Available saves:\n1. autosave_1 ("), "{listing}");
        assert!(listing.ends_with(", Gym Day)"), "{listing}");
        let listing = engine.process_text_command("load").unwrap();
        assert!(listing.ends_with("Use 'load [name]' to load a specific save."));

        assert_eq!(
            engine.process_text_command("delete").unwrap(),
            "Please specify a save name to delete."
        );
        assert_eq!(
            engine.process_text_command("delete autosave_1").unwrap(),
            "Save 'autosave_1' deleted."
        );
        assert_eq!(engine.process_text_command("quit").unwrap(), "Goodbye!");

        let err = engine.process_text_command("sav").unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"Unknown command: sav. Did you mean 'save'?");
    }

    #[test]
    fn restart_keeps_player_name() {
        let Fixture { mut engine, _dir } = fixture();
        engine.initialize_game(Some("Sam"), None, false).unwrap();
        engine.handle_choice(0).unwrap();
        assert_eq!(engine.process_text_command("restart").unwrap(), "Game restarted.");
        let state = engine.state().unwrap();
        assert_eq!(state.current_scene_id, "lobby");
        assert_eq!(state.player.name, "Sam");
    }

    #[test]
    fn operations_need_a_game() {
        let dir = TempDir::new().unwrap();
        let mut engine = Engine::new(EngineConfig::new(dir.path().join("stories")));
        assert!(engine.stories().unwrap().is_empty());
        assert!(matches!(engine.current_scene_text(), Err(EngineError::NoActiveGame)));
        assert!(matches!(
            engine.initialize_game(None, None, false),
            Err(EngineError::NoStoryLoaded)
        ));
        assert!(matches!(engine.advance_time(), Err(EngineError::NoActiveGame)));
    }

    #[test]
    fn advance_time_refreshes_view() {
        let Fixture { mut engine, _dir } = fixture();
        engine.current_scene_view().unwrap();
        for _ in 0..4 {
            engine.advance_time().unwrap();
        }
        let state = engine.state().unwrap();
        assert_eq!(state.day, 2);
        assert_eq!(state.player.stat("days_since_exercise"), &Value::Integer(1));
    }
}
