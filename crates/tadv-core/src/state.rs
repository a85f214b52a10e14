use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::character::Character;
use crate::value::Value;

/// Part of the day. Cycles morning → afternoon → evening → night.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    /// First period of a day.
    #[default]
    Morning,
    /// Second period.
    Afternoon,
    /// Third period.
    Evening,
    /// Last period; advancing from here starts a new day.
    Night,
}

impl TimeOfDay {
    /// The following period. Returns `true` alongside it when a new day begins.
    pub fn next(self) -> (Self, bool) {
        match self {
            Self::Morning => (Self::Afternoon, false),
            Self::Afternoon => (Self::Evening, false),
            Self::Evening => (Self::Night, false),
            Self::Night => (Self::Morning, true),
        }
    }

    /// Lowercase name as exposed to story expressions.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::Night => "night",
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The full mutable state of one game.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    /// Scene the player is currently in.
    pub current_scene_id: String,
    /// The player character.
    pub player: Character,
    /// Non-player characters keyed by name.
    pub npcs: HashMap<String, Character>,
    /// Every scene the player has entered.
    pub visited_scenes: HashSet<String>,
    /// Story events marked as done by actions.
    pub completed_events: HashSet<String>,
    /// Free-form story variables.
    pub variables: HashMap<String, Value>,
    /// Day counter, starting at 1.
    pub day: u32,
    /// Current part of the day.
    pub time_of_day: TimeOfDay,
}

impl GameState {
    /// Start a game at `start_scene`, which counts as visited.
    pub fn new(start_scene: impl Into<String>, player: Character) -> Self {
        let start_scene = start_scene.into();
        let mut visited_scenes = HashSet::new();
        visited_scenes.insert(start_scene.clone());
        Self {
            current_scene_id: start_scene,
            player,
            npcs: HashMap::new(),
            visited_scenes,
            completed_events: HashSet::new(),
            variables: HashMap::new(),
            day: 1,
            time_of_day: TimeOfDay::Morning,
        }
    }

    /// Move to another scene and record it as visited.
    pub fn change_scene(&mut self, scene_id: impl Into<String>) {
        let scene_id = scene_id.into();
        self.visited_scenes.insert(scene_id.clone());
        self.current_scene_id = scene_id;
    }

    /// Whether the player has entered `scene_id`.
    pub fn has_visited(&self, scene_id: &str) -> bool {
        self.visited_scenes.contains(scene_id)
    }

    /// Mark a story event as completed.
    pub fn complete_event(&mut self, event: impl Into<String>) {
        self.completed_events.insert(event.into());
    }

    /// Whether a story event has been completed.
    pub fn has_completed(&self, event: &str) -> bool {
        self.completed_events.contains(event)
    }

    /// Look up a story variable.
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Set a story variable.
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Add an NPC, replacing any previous one with the same name.
    pub fn add_npc(&mut self, npc: Character) {
        self.npcs.insert(npc.name.clone(), npc);
    }

    /// Find the player or an NPC by name.
    pub fn character(&self, name: &str) -> Option<&Character> {
        if self.player.name == name {
            return Some(&self.player);
        }
        self.npcs.get(name)
    }

    /// Mutable variant of [`GameState::character`].
    pub fn character_mut(&mut self, name: &str) -> Option<&mut Character> {
        if self.player.name == name {
            return Some(&mut self.player);
        }
        self.npcs.get_mut(name)
    }

    /// Advance one period. Passing night starts a new day and runs the
    /// daily update for the player and every NPC.
    pub fn advance_time(&mut self) {
        let (next, new_day) = self.time_of_day.next();
        self.time_of_day = next;
        if new_day {
            self.day += 1;
            daily_update(&mut self.player);
            for npc in self.npcs.values_mut() {
                daily_update(npc);
            }
        }
    }
}

/// Reset daily counters, decay motivation after a long break from exercise,
/// and adjust energy from the last night's sleep.
fn daily_update(character: &mut Character) {
    character.set_stat("meals_today", 0);

    let idle_days = match character.stat("days_since_exercise") {
        Value::Integer(n) => *n,
        Value::Float(f) => *f as i64,
        _ => 0,
    };
    character.set_stat("days_since_exercise", idle_days + 1);

    if idle_days > 3 {
        character.adjust_stat("motivation", -2.0);
    }

    let sleep = character.stat("sleep_hours").as_f64().unwrap_or(7.0);
    if sleep < 6.0 {
        character.adjust_stat("energy", -15.0);
    } else if sleep > 8.0 {
        character.adjust_stat("energy", 10.0);
    }
}
