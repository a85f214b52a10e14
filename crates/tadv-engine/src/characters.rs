//! Character templates and building characters from story declarations.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tadv_core::{Character, Value};
use tadv_dsl::CharacterDecl;

use crate::error::{EngineError, EngineResult};

const TEMPLATE_EXTENSION: &str = "tchar";

/// Contents of a `.tchar` file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CharacterTemplate {
    /// Base stats. Declaration attributes override these.
    #[serde(default)]
    pub stats: HashMap<String, Value>,
    /// Starting items.
    #[serde(default)]
    pub inventory: Vec<Value>,
    /// Starting relationships, by character name.
    #[serde(default)]
    pub relationships: HashMap<String, Value>,
}

/// Candidate files for a template reference, most specific first.
fn candidates(templates_dir: &Path, reference: &str) -> Vec<PathBuf> {
    let base = Path::new(reference);
    let path = if base.is_absolute() {
        base.to_path_buf()
    } else {
        templates_dir.join(base)
    };
    let mut paths = vec![path.clone()];
    if path.extension().is_none() {
        paths.push(path.with_extension(TEMPLATE_EXTENSION));
    }
    paths
}

impl CharacterTemplate {
    /// Load a template by file name, relative to `templates_dir` unless
    /// absolute. A name without an extension also tries `.tchar`.
    pub fn load(templates_dir: &Path, reference: &str) -> EngineResult<Self> {
        let paths = candidates(templates_dir, reference);
        let Some(path) = paths.iter().find(|p| p.is_file()) else {
            return Err(EngineError::TemplateNotFound(paths[0].clone()));
        };
        let text = fs::read_to_string(path).map_err(|error| {
            tracing::warn!(path = %path.display(), %error, "cannot read character template");
            EngineError::TemplateNotFound(path.clone())
        })?;
        let template = serde_json::from_str(&text).map_err(|source| EngineError::InvalidTemplate {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded character template");
        Ok(template)
    }

    /// Build a character from the template. `overrides` win over template
    /// stats.
    pub fn instantiate(
        &self,
        name: &str,
        is_player: bool,
        overrides: &HashMap<String, Value>,
    ) -> Character {
        let mut stats = self.stats.clone();
        stats.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        stats.remove("is_player");

        let mut character = Character::with_stats(name, is_player, stats);
        character.inventory = self.inventory.clone();
        character.relationships = self.relationships.clone();
        character
    }
}

/// Build a character from its declaration, loading its template if it
/// names one.
pub fn build_character(
    decl: &CharacterDecl,
    name: &str,
    is_player: bool,
    templates_dir: &Path,
) -> EngineResult<Character> {
    let template = match &decl.template {
        Some(reference) => CharacterTemplate::load(templates_dir, reference)?,
        None => CharacterTemplate::default(),
    };
    Ok(template.instantiate(name, is_player, &decl.attributes))
}
