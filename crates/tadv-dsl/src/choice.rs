//! Grammar for `* text -> action goto:scene story:id[:scene] if cond else goto:alt`.
//!
//! Shared by the story parser (structural choices) and the template processor
//! (choices extracted from rendered text).

use tadv_core::Choice;
use thiserror::Error;

/// A choice line that cannot be turned into a [`Choice`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ChoiceSyntaxError(pub String);

/// Whether a trimmed line is a choice line.
pub fn is_choice_line(line: &str) -> bool {
    line.trim_start().starts_with('*')
}

/// Whitespace-separated words of `s` with their byte offsets.
fn words(s: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, c) in s.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(st)) => {
                out.push((st, &s[st..i]));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(st) = start {
        out.push((st, &s[st..]));
    }
    out
}

fn is_keyword(word: &str) -> bool {
    word.starts_with("goto:") || word.starts_with("story:") || word == "if"
}

/// Parse a choice line. The leading `*` is optional.
pub fn parse_choice_line(line: &str) -> Result<Choice, ChoiceSyntaxError> {
    let body = line.trim();
    let body = body.strip_prefix('*').unwrap_or(body).trim();

    let Some((text, action)) = body.split_once("->") else {
        if body.is_empty() {
            return Err(ChoiceSyntaxError("choice has no text".into()));
        }
        return Ok(Choice::new(body));
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(ChoiceSyntaxError("choice has no text".into()));
    }
    let mut choice = Choice::new(text);

    let tokens = words(action);
    let action_len = tokens.iter().take_while(|(_, w)| !is_keyword(w)).count();
    if action_len > 0 {
        let names: Vec<&str> = tokens[..action_len].iter().map(|(_, w)| *w).collect();
        choice.action_id = Some(names.join(" "));
    }

    let mut i = action_len;
    while i < tokens.len() {
        let (offset, word) = tokens[i];
        if let Some(target) = word.strip_prefix("goto:") {
            if target.is_empty() {
                return Err(ChoiceSyntaxError("choice has an empty goto target".into()));
            }
            choice.next_scene = Some(target.to_string());
        } else if let Some(story) = word.strip_prefix("story:") {
            let (story, scene) = match story.split_once(':') {
                Some((story, scene)) => (story, Some(scene)),
                None => (story, None),
            };
            if story.is_empty() {
                return Err(ChoiceSyntaxError("choice has an empty story id".into()));
            }
            choice.next_story = Some(story.to_string());
            if let Some(scene) = scene.filter(|s| !s.is_empty()) {
                choice.next_scene = Some(scene.to_string());
            }
        } else if word == "if" {
            let cond_start = offset + word.len();
            let else_at = tokens[i + 1..].iter().position(|(_, w)| *w == "else");
            let cond_end = else_at.map_or(action.len(), |j| tokens[i + 1 + j].0);
            let condition = action[cond_start..cond_end].trim();
            if condition.is_empty() {
                return Err(ChoiceSyntaxError("choice has an empty condition".into()));
            }
            choice.condition = Some(condition.to_string());

            let Some(j) = else_at else {
                break;
            };
            let alternate = match &tokens[i + 2 + j..] {
                [(_, alt)] => alt.strip_prefix("goto:").filter(|s| !s.is_empty()),
                _ => None,
            };
            let Some(alternate) = alternate else {
                return Err(ChoiceSyntaxError(
                    "expected `goto:<scene>` after `else`".into(),
                ));
            };
            choice.alternate_scene = Some(alternate.to_string());
            break;
        } else {
            return Err(ChoiceSyntaxError(format!("unexpected `{word}` in choice")));
        }
        i += 1;
    }

    Ok(choice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_choice() {
        let c = parse_choice_line("* Go north -> fight goto:forest if energy > 20").unwrap();
        assert_eq!(c.text, "Go north");
        assert_eq!(c.action_id.as_deref(), Some("fight"));
        assert_eq!(c.next_scene.as_deref(), Some("forest"));
        assert_eq!(c.condition.as_deref(), Some("energy > 20"));
        assert_eq!(c.next_story, None);
    }

    #[test]
    fn text_only() {
        let c = parse_choice_line("*   Wait a moment  ").unwrap();
        assert_eq!(c, Choice::new("Wait a moment"));
    }

    #[test]
    fn multi_word_action() {
        let c = parse_choice_line("* Eat -> eat breakfast goto:kitchen").unwrap();
        assert_eq!(c.action_id.as_deref(), Some("eat breakfast"));
        assert_eq!(c.next_scene.as_deref(), Some("kitchen"));
    }

    #[test]
    fn action_named_like_keyword_prefix() {
        // Only the exact word `if` ends the action id
        let c = parse_choice_line("* Think -> iffy_plan goto:desk").unwrap();
        assert_eq!(c.action_id.as_deref(), Some("iffy_plan"));
    }

    #[test]
    fn story_transition_with_scene() {
        let c = parse_choice_line("* Travel -> story:city:gate").unwrap();
        assert_eq!(c.next_story.as_deref(), Some("city"));
        assert_eq!(c.next_scene.as_deref(), Some("gate"));
        assert_eq!(c.action_id, None);
    }

    #[test]
    fn story_transition_without_scene() {
        let c = parse_choice_line("* Travel -> story:city").unwrap();
        assert_eq!(c.next_story.as_deref(), Some("city"));
        assert_eq!(c.next_scene, None);
    }

    #[test]
    fn conditional_with_alternate() {
        let c =
            parse_choice_line("* Climb -> climb goto:summit if player.fitness_level >= 40 else goto:fall")
                .unwrap();
        assert_eq!(c.action_id.as_deref(), Some("climb"));
        assert_eq!(c.next_scene.as_deref(), Some("summit"));
        assert_eq!(c.condition.as_deref(), Some("player.fitness_level >= 40"));
        assert_eq!(c.alternate_scene.as_deref(), Some("fall"));
    }

    #[test]
    fn condition_keeps_inner_spacing() {
        let c = parse_choice_line("* Ask -> goto:desk if var('met',  False) == False").unwrap();
        assert_eq!(c.condition.as_deref(), Some("var('met',  False) == False"));
    }

    #[test]
    fn errors() {
        assert!(parse_choice_line("* -> goto:x").is_err());
        assert!(parse_choice_line("* Go -> goto:").is_err());
        assert!(parse_choice_line("* Go -> goto:x if").is_err());
        assert!(parse_choice_line("* Go -> goto:x if a else b").is_err());
        assert!(parse_choice_line("* Go -> goto:x later").is_err());
        assert!(parse_choice_line("*").is_err());
    }

    #[test]
    fn recognizes_choice_lines() {
        assert!(is_choice_line("  * Go"));
        assert!(!is_choice_line("Go *"));
    }
}
