//! Loading a story file together with everything it imports.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::diagnostics::Diagnostic;
use crate::error::{DslError, DslResult};
use crate::story::{ParseMode, StoryDocument, parse_into};

/// One file that contributed to a loaded story.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path as resolved when the file was read.
    pub path: PathBuf,
    /// Full file contents, kept for rendering diagnostics.
    pub source: String,
    /// Diagnostics whose spans point into `source`.
    pub diagnostics: Vec<Diagnostic>,
}

/// A story document merged from its main file and all imports.
#[derive(Debug, Clone)]
pub struct LoadedStory {
    /// Every file's content merged together.
    pub document: StoryDocument,
    /// The main file first, then imports in the order they were read.
    pub files: Vec<SourceFile>,
}

impl LoadedStory {
    /// Whether any file produced an error diagnostic.
    pub fn has_errors(&self) -> bool {
        self.files
            .iter()
            .flat_map(|f| &f.diagnostics)
            .any(Diagnostic::is_error)
    }

    /// All diagnostics with the file they belong to.
    pub fn diagnostics(&self) -> impl Iterator<Item = (&SourceFile, &Diagnostic)> {
        self.files
            .iter()
            .flat_map(|f| f.diagnostics.iter().map(move |d| (f, d)))
    }
}

fn mode_for(path: &Path) -> ParseMode {
    match path.extension().and_then(|e| e.to_str()) {
        Some("tscene") => ParseMode::Fragment,
        _ => ParseMode::Story,
    }
}

fn read(path: &Path) -> DslResult<String> {
    fs::read_to_string(path).map_err(|source| DslError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load `path` and resolve its `@import` directives depth-first.
///
/// Import paths are relative to the importing file unless absolute. Each
/// file is read at most once, so import cycles terminate. A missing import
/// is an error diagnostic on the importing file; only a missing main file
/// is an `Err`.
pub fn load_story_file(path: &Path) -> DslResult<LoadedStory> {
    if !path.is_file() {
        return Err(DslError::NotFound(path.to_path_buf()));
    }

    let mut loader = Loader {
        document: StoryDocument::default(),
        files: Vec::new(),
        seen: HashSet::new(),
    };
    loader.load(path)?;
    tracing::info!(
        path = %path.display(),
        files = loader.files.len(),
        scenes = loader.document.scenes.len(),
        "loaded story"
    );

    Ok(LoadedStory {
        document: loader.document,
        files: loader.files,
    })
}

struct Loader {
    document: StoryDocument,
    files: Vec<SourceFile>,
    seen: HashSet<PathBuf>,
}

impl Loader {
    fn load(&mut self, path: &Path) -> DslResult<()> {
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if !self.seen.insert(key) {
            tracing::debug!(path = %path.display(), "import already loaded");
            return Ok(());
        }

        let source = read(path)?;

        // Collect this file's imports separately so resolution stays
        // relative to the file that declared them.
        let outer_imports = std::mem::take(&mut self.document.imports);
        let mut diagnostics = parse_into(&mut self.document, &source, mode_for(path));
        let own_imports = std::mem::replace(&mut self.document.imports, outer_imports);
        for import in &own_imports {
            if !self.document.imports.contains(import) {
                self.document.imports.push(import.clone());
            }
        }

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let mut pending = Vec::new();
        for import in own_imports {
            let target = if Path::new(&import).is_absolute() {
                PathBuf::from(&import)
            } else {
                base.join(&import)
            };
            if target.is_file() {
                pending.push(target);
            } else {
                let start = source.find(&import).unwrap_or(0);
                diagnostics.push(
                    Diagnostic::error(
                        start..start + import.len(),
                        format!("imported file not found: {}", target.display()),
                    )
                    .with_label("missing import"),
                );
            }
        }

        self.files.push(SourceFile {
            path: path.to_path_buf(),
            source,
            diagnostics,
        });

        for target in pending {
            self.load(&target)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn loads_single_file() {
        let dir = TempDir::new().unwrap();
        let main = write(
            dir.path(),
            "main.tadv",
            "=== metadata ===\ntitle: Solo\n=== scenes ===\n---start: Start\nHello.\n",
        );
        let loaded = load_story_file(&main).unwrap();
        assert_eq!(loaded.document.title(), Some("Solo"));
        assert_eq!(loaded.files.len(), 1);
        assert!(!loaded.has_errors());
    }

    #[test]
    fn missing_main_file_is_err() {
        let dir = TempDir::new().unwrap();
        let err = load_story_file(&dir.path().join("nope.tadv")).unwrap_err();
        assert!(matches!(err, DslError::NotFound(_)));
    }

    #[test]
    fn resolves_nested_imports_relative_to_importer() {
        let dir = TempDir::new().unwrap();
        let main = write(
            dir.path(),
            "main.tadv",
            "@import parts/gym.tscene\n=== scenes ===\n---start: Start\n* Go -> goto:gym\n",
        );
        write(
            dir.path(),
            "parts/gym.tscene",
            "@import more.tscene\n---gym: Gym\nLifting.\n",
        );
        write(dir.path(), "parts/more.tscene", "---pool: Pool\nSwimming.\n");

        let loaded = load_story_file(&main).unwrap();
        assert_eq!(loaded.files.len(), 3);
        assert!(loaded.document.scenes.contains("gym"));
        assert!(loaded.document.scenes.contains("pool"));
        assert_eq!(
            loaded.document.imports,
            vec!["parts/gym.tscene".to_string(), "more.tscene".to_string()]
        );
    }

    #[test]
    fn import_cycles_terminate() {
        let dir = TempDir::new().unwrap();
        let a = write(
            dir.path(),
            "a.tadv",
            "@import b.tadv\n=== scenes ===\n---start: A\nA.\n",
        );
        write(
            dir.path(),
            "b.tadv",
            "@import a.tadv\n=== scenes ===\n---other: B\nB.\n",
        );
        let loaded = load_story_file(&a).unwrap();
        assert_eq!(loaded.files.len(), 2);
        assert_eq!(loaded.document.scenes.len(), 2);
    }

    #[test]
    fn missing_import_is_error_diagnostic() {
        let dir = TempDir::new().unwrap();
        let source = "@import ghost.tscene\n=== scenes ===\n---start: Start\nHi.\n";
        let main = write(dir.path(), "main.tadv", source);
        let loaded = load_story_file(&main).unwrap();
        assert!(loaded.has_errors());
        let (file, diag) = loaded.diagnostics().next().unwrap();
        assert_eq!(file.path, main);
        assert_eq!(&source[diag.span.clone()], "ghost.tscene");
    }

    #[test]
    fn fragment_ignores_metadata() {
        let dir = TempDir::new().unwrap();
        let main = write(
            dir.path(),
            "main.tadv",
            "=== metadata ===\ntitle: Real\n@import frag.tscene\n=== scenes ===\n---start: S\nx\n",
        );
        write(
            dir.path(),
            "frag.tscene",
            "=== metadata ===\ntitle: Fake\n=== scenes ===\n---extra: E\ny\n",
        );
        let loaded = load_story_file(&main).unwrap();
        assert_eq!(loaded.document.title(), Some("Real"));
        assert!(loaded.document.scenes.contains("extra"));
        assert!(!loaded.files[1].diagnostics.is_empty());
    }

    #[test]
    fn imported_story_appends_functions() {
        let dir = TempDir::new().unwrap();
        let main = write(
            dir.path(),
            "main.tadv",
            "@import lib.tadv\n=== functions ===\nmain_fn\n=== scenes ===\n---start: S\nx\n",
        );
        write(
            dir.path(),
            "lib.tadv",
            "=== functions ===\nlib_fn\n",
        );
        let loaded = load_story_file(&main).unwrap();
        assert!(loaded.document.functions.contains("main_fn"));
        assert!(loaded.document.functions.contains("lib_fn"));
    }
}
