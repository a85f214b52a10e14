//! Structural checks over a parsed story.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use tadv_core::Scene;

use crate::choice::{is_choice_line, parse_choice_line};
use crate::diagnostics::Severity;
use crate::story::{StoryDocument, parse_goto};

/// A problem with the scene graph as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Only errors fail `tadv check`.
    pub severity: Severity,
    /// Human-readable description naming the scene involved.
    pub message: String,
}

impl ValidationIssue {
    fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    /// Whether this issue makes the story unplayable.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Local scene ids a scene can lead to, including choices and `@goto`s that
/// only appear inside conditional content.
fn outgoing(scene: &Scene) -> Vec<String> {
    let mut targets: Vec<String> = scene
        .choices
        .iter()
        .flat_map(|c| c.local_targets())
        .map(str::to_string)
        .collect();
    if let Some(auto) = &scene.auto_transition {
        targets.push(auto.target.clone());
    }
    for line in scene.content.lines().map(str::trim) {
        if let Some(directive) = line.strip_prefix("@goto:")
            && let Some(auto) = parse_goto(directive)
        {
            targets.push(auto.target);
        } else if is_choice_line(line)
            && let Ok(choice) = parse_choice_line(line)
        {
            targets.extend(choice.local_targets().map(str::to_string));
        }
    }
    targets
}

/// Check targets and reachability from `start`.
///
/// Targets that only appear in conditional content are used for
/// reachability but not reported when unknown, since they may never render.
pub fn validate(doc: &StoryDocument, start: &str) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let scenes = &doc.scenes;

    if !scenes.contains(start) {
        issues.push(ValidationIssue::error(format!(
            "start scene `{start}` does not exist"
        )));
    }

    for scene in scenes.iter() {
        for choice in &scene.choices {
            for target in choice.local_targets() {
                if !scenes.contains(target) {
                    issues.push(ValidationIssue::warning(format!(
                        "choice `{}` in scene `{}` leads to unknown scene `{target}`",
                        choice.text, scene.id
                    )));
                }
            }
        }
        if let Some(auto) = &scene.auto_transition
            && !scenes.contains(&auto.target)
        {
            issues.push(ValidationIssue::warning(format!(
                "scene `{}` continues to unknown scene `{}`",
                scene.id, auto.target
            )));
        }
    }

    if scenes.contains(start) {
        let mut seen: HashSet<&str> = HashSet::from([start]);
        let mut queue = VecDeque::from([start.to_string()]);
        while let Some(id) = queue.pop_front() {
            let Some(scene) = scenes.get(&id) else {
                continue;
            };
            for target in outgoing(scene) {
                if let Some(known) = scenes.get(&target)
                    && seen.insert(known.id.as_str())
                {
                    queue.push_back(target);
                }
            }
        }
        for scene in scenes.iter() {
            if !seen.contains(scene.id.as_str()) {
                issues.push(ValidationIssue::warning(format!(
                    "scene `{}` is unreachable from `{start}`",
                    scene.id
                )));
            }
        }
    }

    issues
}
