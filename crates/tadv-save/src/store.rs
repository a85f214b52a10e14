//! Save files on disk, one pretty-printed JSON file per save.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tadv_core::TimeOfDay;

use crate::error::{SaveError, SaveResult};
use crate::snapshot::GameStateSnapshot;

const EXTENSION: &str = "save";

/// Contents of a `.save` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRecord {
    /// Story the game belongs to.
    pub story_id: String,
    /// Story title at save time, for listings.
    #[serde(default)]
    pub title: String,
    /// The saved game.
    pub state: GameStateSnapshot,
    /// When the save was written.
    pub timestamp: DateTime<Utc>,
}

impl SaveRecord {
    /// A record stamped with the current time.
    pub fn new(
        story_id: impl Into<String>,
        title: impl Into<String>,
        state: GameStateSnapshot,
    ) -> Self {
        Self {
            story_id: story_id.into(),
            title: title.into(),
            state,
            timestamp: Utc::now(),
        }
    }
}

/// What a save listing shows without restoring anything.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveSummary {
    /// File stem of the save.
    pub name: String,
    /// Story the game belongs to.
    pub story_id: String,
    /// Story title at save time.
    pub title: String,
    /// In-game day.
    pub day: u32,
    /// In-game time of day.
    pub time_of_day: TimeOfDay,
    /// When the save was written.
    pub timestamp: DateTime<Utc>,
}

/// A directory of save files.
#[derive(Debug, Clone)]
pub struct SaveStore {
    dir: PathBuf,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SaveError + '_ {
    move |source| SaveError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl SaveStore {
    /// A store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the save files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve a save name, with or without the `.save` suffix, to its file.
    fn path_for(&self, name: &str) -> SaveResult<PathBuf> {
        let name = name.trim();
        let stem = name.strip_suffix(".save").unwrap_or(name);
        if stem.is_empty() || stem.contains(['/', '\\']) || stem == "." || stem == ".." {
            return Err(SaveError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{stem}.{EXTENSION}")))
    }

    /// Whether a save with this name exists.
    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_ok_and(|p| p.is_file())
    }

    /// Write `record` under `name`, replacing any existing save.
    pub fn save(&self, name: &str, record: &SaveRecord) -> SaveResult<PathBuf> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.dir).map_err(io_error(&self.dir))?;
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&path, json).map_err(io_error(&path))?;
        tracing::info!(path = %path.display(), story = %record.story_id, "game saved");
        Ok(path)
    }

    /// Read a save by name.
    pub fn load(&self, name: &str) -> SaveResult<SaveRecord> {
        let path = self.path_for(name)?;
        if !path.is_file() {
            return Err(SaveError::NotFound(name.to_string()));
        }
        let text = fs::read_to_string(&path).map_err(io_error(&path))?;
        serde_json::from_str(&text).map_err(|source| SaveError::Corrupt { path, source })
    }

    /// Remove a save by name.
    pub fn delete(&self, name: &str) -> SaveResult<()> {
        let path = self.path_for(name)?;
        if !path.is_file() {
            return Err(SaveError::NotFound(name.to_string()));
        }
        fs::remove_file(&path).map_err(io_error(&path))?;
        tracing::info!(path = %path.display(), "save deleted");
        Ok(())
    }

    /// Summaries of every readable save, newest first.
    ///
    /// A missing directory lists as empty. Unreadable files are skipped.
    pub fn list(&self) -> SaveResult<Vec<SaveSummary>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut saves = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(io_error(&self.dir))? {
            let path = entry.map_err(io_error(&self.dir))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let record = fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|text| {
                    serde_json::from_str::<SaveRecord>(&text).map_err(|e| e.to_string())
                });
            match record {
                Ok(record) => saves.push(SaveSummary {
                    name: name.to_string(),
                    story_id: record.story_id,
                    title: record.title,
                    day: record.state.day,
                    time_of_day: record.state.time_of_day,
                    timestamp: record.timestamp,
                }),
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "skipping unreadable save");
                }
            }
        }

        saves.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.name.cmp(&b.name)));
        Ok(saves)
    }
}
