//! Serializable copies of [`GameState`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tadv_core::{Character, GameState, TimeOfDay, Value};

fn first_day() -> u32 {
    1
}

/// A self-contained, JSON-friendly copy of a game state.
///
/// Sets become sorted lists so that the same state always serializes to the
/// same text. Variables that cannot survive a JSON round-trip are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStateSnapshot {
    /// Scene the player is in.
    pub current_scene_id: String,
    /// Player character with stats, inventory, and relationships.
    pub player: Character,
    /// Non-player characters by name.
    #[serde(default)]
    pub npcs: BTreeMap<String, Character>,
    /// Sorted ids of visited scenes.
    #[serde(default)]
    pub visited_scenes: Vec<String>,
    /// Sorted ids of completed events.
    #[serde(default)]
    pub completed_events: Vec<String>,
    /// Story variables that survive JSON.
    #[serde(default)]
    pub variables: BTreeMap<String, Value>,
    /// Day counter, starting at 1.
    #[serde(default = "first_day")]
    pub day: u32,
    /// Period within the day.
    #[serde(default)]
    pub time_of_day: TimeOfDay,
}

fn sorted(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut items: Vec<String> = items.into_iter().collect();
    items.sort();
    items
}

impl From<&GameState> for GameStateSnapshot {
    fn from(state: &GameState) -> Self {
        let variables = state
            .variables
            .iter()
            .filter(|(name, value)| {
                let keep = value.is_json_safe();
                if !keep {
                    tracing::debug!(variable = %name, "variable left out of snapshot");
                }
                keep
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Self {
            current_scene_id: state.current_scene_id.clone(),
            player: state.player.clone(),
            npcs: state
                .npcs
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            visited_scenes: sorted(state.visited_scenes.iter().cloned()),
            completed_events: sorted(state.completed_events.iter().cloned()),
            variables,
            day: state.day,
            time_of_day: state.time_of_day,
        }
    }
}

impl GameStateSnapshot {
    /// Rebuild a live state from the snapshot.
    pub fn restore(&self) -> GameState {
        self.clone().into()
    }
}

impl From<GameStateSnapshot> for GameState {
    fn from(snapshot: GameStateSnapshot) -> Self {
        GameState {
            current_scene_id: snapshot.current_scene_id,
            player: snapshot.player,
            npcs: snapshot.npcs.into_iter().collect(),
            visited_scenes: snapshot.visited_scenes.into_iter().collect(),
            completed_events: snapshot.completed_events.into_iter().collect(),
            variables: snapshot.variables.into_iter().collect(),
            day: snapshot.day,
            time_of_day: snapshot.time_of_day,
        }
    }
}
