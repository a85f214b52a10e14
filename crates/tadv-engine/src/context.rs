//! Names and functions visible to story expressions.

use std::collections::BTreeMap;

use tadv_core::{Character, GameState, Value};
use tadv_dsl::expr::{EvalError, Scope, get_field};

/// Keep only alphanumeric characters, so `Coach Kim` is reachable as
/// `CoachKim`.
pub fn sanitize_name(name: &str) -> String {
    name.chars().filter(|c| c.is_alphanumeric()).collect()
}

/// A character as an expression value.
///
/// Stats appear both directly (`player.energy`) and under `stats`
/// (`player.stats.energy`); the fixed fields win over a stat of the same
/// name.
pub fn character_value(character: &Character) -> Value {
    let mut map: BTreeMap<String, Value> = character
        .stats
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let stats = Value::Map(map.clone());
    map.insert("name".into(), Value::String(character.name.clone()));
    map.insert("is_player".into(), Value::Boolean(character.is_player));
    map.insert("inventory".into(), Value::List(character.inventory.clone()));
    map.insert(
        "relationships".into(),
        Value::Map(
            character
                .relationships
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
    );
    map.insert("stats".into(), stats);
    Value::Map(map)
}

/// Read-only view of a game state for one evaluation.
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    state: &'a GameState,
}

impl<'a> EvalContext<'a> {
    /// A scope over `state`.
    pub fn new(state: &'a GameState) -> Self {
        Self { state }
    }

    fn game_value(&self) -> Value {
        let state = self.state;
        let mut map = BTreeMap::new();
        map.insert("day".to_string(), Value::Integer(i64::from(state.day)));
        map.insert(
            "time_of_day".to_string(),
            Value::from(state.time_of_day.as_str()),
        );
        map.insert(
            "scene".to_string(),
            Value::String(state.current_scene_id.clone()),
        );
        map.insert(
            "variables".to_string(),
            Value::Map(
                state
                    .variables
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
        );
        Value::Map(map)
    }

    /// Look up a single top-level name.
    fn lookup(&self, name: &str) -> Value {
        let state = self.state;
        match name {
            "day" => Value::Integer(i64::from(state.day)),
            "time_of_day" => Value::from(state.time_of_day.as_str()),
            "player" => character_value(&state.player),
            "game" => self.game_value(),
            _ => {
                if let Some(npc) = state.npcs.values().find(|c| sanitize_name(&c.name) == name) {
                    return character_value(npc);
                }
                state.player.stat(name).clone()
            }
        }
    }
}

impl Scope for EvalContext<'_> {
    fn resolve(&self, path: &[String]) -> Result<Value, EvalError> {
        let Some((head, rest)) = path.split_first() else {
            return Ok(Value::Null);
        };
        rest.iter()
            .try_fold(self.lookup(head), |value, field| get_field(&value, field))
    }

    fn call(&self, name: &str, args: &[Value]) -> Option<Result<Value, EvalError>> {
        let result = match name {
            "var" => match args {
                [Value::String(key)] => Ok(self.state.variable(key).cloned().unwrap_or_default()),
                [Value::String(key), default] => Ok(self
                    .state
                    .variable(key)
                    .cloned()
                    .unwrap_or_else(|| default.clone())),
                [_] | [_, _] => Err(EvalError::Type("var() needs a string name".into())),
                _ => Err(EvalError::Arity {
                    name: name.to_string(),
                    expected: "1 or 2",
                    got: args.len(),
                }),
            },
            "has_completed" => match args {
                [Value::String(event)] => Ok(Value::Boolean(self.state.has_completed(event))),
                [_] => Err(EvalError::Type(
                    "has_completed() needs a string event".into(),
                )),
                _ => Err(EvalError::Arity {
                    name: name.to_string(),
                    expected: "1",
                    got: args.len(),
                }),
            },
            _ => return None,
        };
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tadv_dsl::expr::{eval_condition, eval_str};

    fn state() -> GameState {
        let mut player = Character::new("Alex", true);
        player.set_stat("energy", 80);
        player.set_stat("weight", 72.5);
        player.inventory.push(Value::from("towel"));
        let mut state = GameState::new("start", player);
        let mut coach = Character::new("Coach Kim", false);
        coach.set_stat("patience", 40);
        state.add_npc(coach);
        state.set_variable("met_coach", true);
        state.complete_event("warmup");
        state
    }

    #[test]
    fn player_fields_and_stats() {
        let state = state();
        let ctx = EvalContext::new(&state);
        assert_eq!(eval_str("player.name", &ctx), Ok(Value::from("Alex")));
        assert_eq!(eval_str("player.energy", &ctx), Ok(Value::Integer(80)));
        assert_eq!(eval_str("player.stats.weight", &ctx), Ok(Value::Float(72.5)));
        assert_eq!(eval_str("'towel' in player.inventory", &ctx), Ok(Value::Boolean(true)));
    }

    #[test]
    fn bare_stats_and_unknown_names() {
        let state = state();
        let ctx = EvalContext::new(&state);
        assert_eq!(eval_str("energy", &ctx), Ok(Value::Integer(80)));
        assert_eq!(eval_str("mystery", &ctx), Ok(Value::Null));
        assert_eq!(eval_str("player.charisma", &ctx), Ok(Value::Null));
        assert!(eval_str("player.name.first", &ctx).is_err());
    }

    #[test]
    fn npcs_by_sanitized_name() {
        let state = state();
        let ctx = EvalContext::new(&state);
        assert_eq!(eval_str("CoachKim.patience", &ctx), Ok(Value::Integer(40)));
        assert_eq!(eval_str("CoachKim.is_player", &ctx), Ok(Value::Boolean(false)));
    }

    #[test]
    fn game_and_time() {
        let state = state();
        let ctx = EvalContext::new(&state);
        assert_eq!(eval_str("day", &ctx), Ok(Value::Integer(1)));
        assert_eq!(eval_str("game.scene", &ctx), Ok(Value::from("start")));
        assert_eq!(eval_str("time_of_day == 'morning'", &ctx), Ok(Value::Boolean(true)));
        assert_eq!(eval_str("game.variables.met_coach", &ctx), Ok(Value::Boolean(true)));
    }

    #[test]
    fn functions() {
        let state = state();
        let ctx = EvalContext::new(&state);
        assert_eq!(eval_str("var('met_coach')", &ctx), Ok(Value::Boolean(true)));
        assert_eq!(eval_str("var('streak', 0) + 1", &ctx), Ok(Value::Integer(1)));
        assert_eq!(eval_str("var('missing')", &ctx), Ok(Value::Null));
        assert_eq!(eval_str("has_completed('warmup')", &ctx), Ok(Value::Boolean(true)));
        assert!(eval_str("var(1)", &ctx).is_err());
        assert!(eval_str("var()", &ctx).is_err());
    }

    #[test]
    fn conditions_treat_missing_stats_as_zero() {
        let state = state();
        let ctx = EvalContext::new(&state);
        assert_eq!(eval_condition("player.stress > 10", &ctx), Ok(false));
        assert_eq!(eval_condition("stress < 10 and energy >= 80", &ctx), Ok(true));
    }
}
