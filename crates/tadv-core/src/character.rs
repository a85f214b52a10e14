use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Stats kept within `0..=100` whenever they are updated numerically.
pub const CLAMPED_STATS: &[&str] = &[
    "motivation",
    "energy",
    "confidence",
    "stress",
    "happiness",
    "body_fat",
    "muscle_mass",
    "discipline",
    "health",
    "fitness_level",
    "positivity",
    "empathy",
    "expertise",
    "supportiveness",
];

static NULL: Value = Value::Null;

/// A player or non-player character.
///
/// Stats are an open attribute bag: any name may be read, and names that were
/// never set read as [`Value::Null`] instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    /// Display name.
    pub name: String,
    /// Whether this character is the player.
    #[serde(default)]
    pub is_player: bool,
    /// Named attributes.
    #[serde(default)]
    pub stats: HashMap<String, Value>,
    /// Carried items. Persisted but not interpreted.
    #[serde(default)]
    pub inventory: Vec<Value>,
    /// Relationship scores or notes keyed by character name.
    #[serde(default)]
    pub relationships: HashMap<String, Value>,
}

impl Character {
    /// Create a character with no stats.
    pub fn new(name: impl Into<String>, is_player: bool) -> Self {
        Self {
            name: name.into(),
            is_player,
            stats: HashMap::new(),
            inventory: Vec::new(),
            relationships: HashMap::new(),
        }
    }

    /// Create a character with initial stats, clamping as [`Character::set_stat`] does.
    pub fn with_stats(
        name: impl Into<String>,
        is_player: bool,
        stats: impl IntoIterator<Item = (String, Value)>,
    ) -> Self {
        let mut character = Self::new(name, is_player);
        character.update_stats(stats);
        character
    }

    /// Get a stat, or [`Value::Null`] when it was never set.
    pub fn stat(&self, name: &str) -> &Value {
        self.stats.get(name).unwrap_or(&NULL)
    }

    /// Whether a stat has been set.
    pub fn has_stat(&self, name: &str) -> bool {
        self.stats.contains_key(name)
    }

    /// Set a single stat. Clamped stats are bounded to `0..=100`.
    pub fn set_stat(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = clamp_stat(&name, value.into());
        self.stats.insert(name, value);
    }

    /// Set several stats at once.
    pub fn update_stats(&mut self, changes: impl IntoIterator<Item = (String, Value)>) {
        for (name, value) in changes {
            self.set_stat(name, value);
        }
    }

    /// Add `delta` to a numeric stat.
    ///
    /// Returns `false` and leaves the stat alone when it is absent or not a number.
    pub fn adjust_stat(&mut self, name: &str, delta: f64) -> bool {
        let next = match self.stat(name) {
            Value::Integer(n) if delta.fract() == 0.0 => Value::Integer(n.saturating_add(delta as i64)),
            Value::Integer(n) => Value::Float(*n as f64 + delta),
            Value::Float(f) => Value::Float(f + delta),
            _ => return false,
        };
        self.set_stat(name.to_string(), next);
        true
    }
}

/// Bound a clamped stat to `0..=100`, keeping integers as integers.
fn clamp_stat(name: &str, value: Value) -> Value {
    if !CLAMPED_STATS.contains(&name) {
        return value;
    }
    match value {
        Value::Integer(n) => Value::Integer(n.clamp(0, 100)),
        Value::Float(f) if !f.is_nan() => Value::Float(f.clamp(0.0, 100.0)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn unknown_stat_is_null() {
        let c = Character::new("Alex", true);
        assert_eq!(c.stat("charisma"), &Value::Null);
        assert!(!c.has_stat("charisma"));
    }

    #[test]
    fn clamps_known_stats() {
        let mut c = Character::new("Alex", true);
        c.set_stat("energy", 140);
        c.set_stat("stress", -3.5);
        c.set_stat("weight", 140);
        assert_eq!(c.stat("energy"), &Value::Integer(100));
        assert_eq!(c.stat("stress"), &Value::Float(0.0));
        assert_eq!(c.stat("weight"), &Value::Integer(140));
    }

    #[test]
    fn non_numeric_values_pass_through() {
        let mut c = Character::new("Alex", true);
        c.set_stat("energy", "high");
        assert_eq!(c.stat("energy"), &Value::from("high"));
    }

    #[test]
    fn adjust_keeps_integer_type() {
        let mut c = Character::with_stats("Alex", true, [("energy".to_string(), Value::from(95))]);
        assert!(c.adjust_stat("energy", 10.0));
        assert_eq!(c.stat("energy"), &Value::Integer(100));
        assert!(!c.adjust_stat("motivation", -2.0));
        assert!(!c.has_stat("motivation"));
    }

    #[test]
    fn serde_defaults_missing_collections() {
        let c: Character = serde_json::from_str(r#"{"name": "Sam"}"#).unwrap();
        assert_eq!(c.name, "Sam");
        assert!(!c.is_player);
        assert!(c.stats.is_empty());
    }

    proptest! {
        #[test]
        fn clamped_stats_stay_in_range(
            idx in 0..CLAMPED_STATS.len(),
            int_value in any::<i64>(),
            float_value in -1.0e9f64..1.0e9,
            delta in -500.0f64..500.0,
        ) {
            let name = CLAMPED_STATS[idx];
            let mut c = Character::new("P", true);

            c.set_stat(name, int_value);
            let n = c.stat(name).as_f64().unwrap();
            prop_assert!((0.0..=100.0).contains(&n));

            c.update_stats([(name.to_string(), Value::Float(float_value))]);
            let f = c.stat(name).as_f64().unwrap();
            prop_assert!((0.0..=100.0).contains(&f));

            c.adjust_stat(name, delta);
            let adjusted = c.stat(name).as_f64().unwrap();
            prop_assert!((0.0..=100.0).contains(&adjusted));
        }
    }
}
