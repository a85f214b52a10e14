//! Line-oriented parser for `.tadv` story files and `.tscene` fragments.
//!
//! Parsing never aborts: malformed lines and headers become [`Diagnostic`]s
//! and the parser moves on to the next line.

use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

use tadv_core::{AutoTransition, Scene, SceneGraph, Value};

use crate::choice::{is_choice_line, parse_choice_line};
use crate::diagnostics::Diagnostic;

/// A character declared in the `characters` section.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterDecl {
    /// Character name.
    pub name: String,
    /// Template file named with `Name@file` syntax.
    pub template: Option<String>,
    /// Typed attributes. These override template stats.
    pub attributes: HashMap<String, Value>,
}

impl CharacterDecl {
    /// Whether the declaration marks the player with `is_player: true`.
    pub fn is_player(&self) -> bool {
        self.attributes
            .get("is_player")
            .is_some_and(Value::is_truthy)
    }
}

/// Everything parsed out of a story file and its imports.
#[derive(Debug, Clone, Default)]
pub struct StoryDocument {
    /// Lowercased metadata keys to values.
    pub metadata: BTreeMap<String, String>,
    /// Character declarations in source order.
    pub characters: Vec<CharacterDecl>,
    /// Scenes in source order.
    pub scenes: SceneGraph,
    /// Text of the `functions` sections. Stored, never executed.
    pub functions: String,
    /// `@import` paths in first-seen order.
    pub imports: Vec<String>,
}

impl StoryDocument {
    /// The `title` metadata entry.
    pub fn title(&self) -> Option<&str> {
        self.metadata.get("title").map(String::as_str)
    }

    /// The `start` metadata entry.
    pub fn start_scene(&self) -> Option<&str> {
        self.metadata.get("start").map(String::as_str)
    }

    /// Find a character declaration by name.
    pub fn character(&self, name: &str) -> Option<&CharacterDecl> {
        self.characters.iter().find(|c| c.name == name)
    }
}

/// How much of the story format a file may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// A full `.tadv` story.
    Story,
    /// A `.tscene` file: scenes and functions only.
    Fragment,
}

/// Parse a complete story file into a fresh document.
pub fn parse_story(source: &str) -> (StoryDocument, Vec<Diagnostic>) {
    let mut doc = StoryDocument::default();
    let diagnostics = parse_into(&mut doc, source, ParseMode::Story);
    (doc, diagnostics)
}

/// Parse `source` into an existing document without resetting it.
///
/// Used for imports: later scenes replace earlier ones with the same ID and
/// metadata keys are overwritten.
pub fn parse_into(doc: &mut StoryDocument, source: &str, mode: ParseMode) -> Vec<Diagnostic> {
    let mut parser = StoryParser::new(doc, mode);
    let mut offset = 0;
    for raw in source.split_inclusive('\n') {
        let line = raw.trim_end_matches(['\n', '\r']);
        parser.line(line, offset..offset + line.len());
        offset += raw.len();
    }
    parser.finish()
}

/// Update a template nesting depth with every `{% %}` tag in `line`.
///
/// `if` opens a block and `endif` closes one; `elif` and `else` stay at the
/// same depth.
pub fn nesting_after(line: &str, mut depth: usize) -> usize {
    let mut rest = line;
    while let Some(start) = rest.find("{%") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("%}") else {
            break;
        };
        match after[..end].split_whitespace().next() {
            Some("if") => depth += 1,
            Some("endif") => depth = depth.saturating_sub(1),
            _ => {}
        }
        rest = &after[end + 2..];
    }
    depth
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Metadata,
    Characters,
    Functions,
    Scenes,
    Ignored,
}

struct OpenScene {
    scene: Scene,
    lines: Vec<String>,
    header: Range<usize>,
}

struct StoryParser<'d> {
    doc: &'d mut StoryDocument,
    mode: ParseMode,
    section: Section,
    diagnostics: Vec<Diagnostic>,
    scene: Option<OpenScene>,
    skipping_scene: bool,
    warned_orphan_text: bool,
    character: Option<usize>,
    functions: Vec<String>,
    depth: usize,
}

impl<'d> StoryParser<'d> {
    fn new(doc: &'d mut StoryDocument, mode: ParseMode) -> Self {
        Self {
            doc,
            mode,
            section: Section::Scenes,
            diagnostics: Vec::new(),
            scene: None,
            skipping_scene: false,
            warned_orphan_text: false,
            character: None,
            functions: Vec::new(),
            depth: 0,
        }
    }

    fn warn(&mut self, span: Range<usize>, message: impl Into<String>) {
        let diag = Diagnostic::warning(span, message);
        tracing::warn!("{}", diag.message);
        self.diagnostics.push(diag);
    }

    fn line(&mut self, line: &str, span: Range<usize>) {
        let trimmed = line.trim();

        if let Some(name) = section_header(trimmed) {
            self.enter_section(&name, span);
            return;
        }
        if self.section == Section::Functions {
            self.functions.push(line.to_string());
            return;
        }
        if line.starts_with('#') {
            return;
        }
        if let Some(rest) = trimmed.strip_prefix("@import")
            && (rest.is_empty() || rest.starts_with(char::is_whitespace))
        {
            let path = rest.trim();
            if path.is_empty() {
                self.warn(span, "`@import` needs a path");
            } else if !self.doc.imports.iter().any(|p| p == path) {
                self.doc.imports.push(path.to_string());
            }
            return;
        }

        match self.section {
            Section::Metadata => self.metadata_line(trimmed, span),
            Section::Characters => self.character_line(trimmed, span),
            Section::Scenes => self.scene_line(line, trimmed, span),
            Section::Functions | Section::Ignored => {}
        }
    }

    fn enter_section(&mut self, name: &str, span: Range<usize>) {
        self.close_scene();
        self.character = None;
        self.skipping_scene = false;
        self.warned_orphan_text = false;

        self.section = match name {
            "metadata" | "characters" if self.mode == ParseMode::Fragment => {
                self.warn(span, format!("`{name}` section is ignored in a scene file"));
                Section::Ignored
            }
            "metadata" => Section::Metadata,
            "characters" => Section::Characters,
            "functions" => Section::Functions,
            "scene" | "scenes" => Section::Scenes,
            other => {
                self.warn(span, format!("unknown section `{other}`"));
                Section::Ignored
            }
        };
    }

    fn metadata_line(&mut self, trimmed: &str, span: Range<usize>) {
        if trimmed.is_empty() {
            return;
        }
        match trimmed.split_once(':') {
            Some((key, value)) if !key.trim().is_empty() => {
                self.doc
                    .metadata
                    .insert(key.trim().to_lowercase(), value.trim().to_string());
            }
            _ => self.warn(span, "expected `key: value` in metadata"),
        }
    }

    fn character_line(&mut self, trimmed: &str, span: Range<usize>) {
        if trimmed.is_empty() {
            return;
        }

        if let Some(decl) = trimmed.strip_prefix('-') {
            let decl = decl.trim();
            let (name, template) = match decl.split_once('@') {
                Some((name, template)) => (name.trim(), Some(template.trim())),
                None => (decl.split_once(':').map_or(decl, |(n, _)| n).trim(), None),
            };
            if name.is_empty() {
                self.warn(span, "character declaration has no name");
                self.character = None;
                return;
            }
            let template = template.filter(|t| !t.is_empty()).map(str::to_string);
            let decl = CharacterDecl {
                name: name.to_string(),
                template,
                attributes: HashMap::new(),
            };
            let index = match self.doc.characters.iter().position(|c| c.name == name) {
                Some(i) => {
                    self.doc.characters[i] = decl;
                    i
                }
                None => {
                    self.doc.characters.push(decl);
                    self.doc.characters.len() - 1
                }
            };
            self.character = Some(index);
            return;
        }

        let Some((key, value)) = trimmed.split_once(':') else {
            self.warn(span, "expected `- Name` or `key: value`");
            return;
        };
        let Some(index) = self.character else {
            self.warn(span, "attribute outside a character declaration");
            return;
        };
        let key = key.trim().to_lowercase();
        if key.is_empty() {
            self.warn(span, "attribute has no name");
            return;
        }
        self.doc.characters[index]
            .attributes
            .insert(key, Value::from_literal(value));
    }

    fn scene_line(&mut self, line: &str, trimmed: &str, span: Range<usize>) {
        if let Some(rest) = trimmed.strip_prefix("---")
            && !rest.chars().all(|c| c == '-')
        {
            self.open_scene(rest, span);
            return;
        }
        if self.skipping_scene {
            return;
        }

        let Some(open) = self.scene.as_mut() else {
            if !trimmed.is_empty() && !self.warned_orphan_text {
                self.warned_orphan_text = true;
                self.warn(span, "text before the first scene header is ignored");
            }
            return;
        };

        if self.depth == 0 {
            if let Some(directive) = trimmed.strip_prefix("@goto:") {
                match parse_goto(directive) {
                    Some(transition) => open.scene.auto_transition = Some(transition),
                    None => self.warn(span, "`@goto:` needs a scene id"),
                }
                return;
            }
            if is_choice_line(trimmed) {
                match parse_choice_line(trimmed) {
                    Ok(choice) => open.scene.choices.push(choice),
                    Err(e) => self.warn(span, e.to_string()),
                }
                return;
            }
        }

        open.lines.push(line.trim_end().to_string());
        self.depth = nesting_after(line, self.depth);
    }

    fn open_scene(&mut self, header: &str, span: Range<usize>) {
        self.close_scene();
        self.warned_orphan_text = false;

        let parsed = header
            .split_once(':')
            .map(|(id, title)| (id.trim(), title.trim()))
            .filter(|(id, _)| !id.is_empty() && !id.contains(char::is_whitespace));

        match parsed {
            Some((id, title)) => {
                self.skipping_scene = false;
                self.scene = Some(OpenScene {
                    scene: Scene::new(id, title),
                    lines: Vec::new(),
                    header: span,
                });
            }
            None => {
                self.skipping_scene = true;
                let diag = Diagnostic::error(span, "malformed scene header")
                    .with_label("expected `---id: Title`");
                tracing::warn!("{}", diag.message);
                self.diagnostics.push(diag);
            }
        }
    }

    fn close_scene(&mut self) {
        let depth = std::mem::take(&mut self.depth);
        let Some(OpenScene {
            mut scene,
            lines,
            header,
        }) = self.scene.take()
        else {
            return;
        };

        let first = lines.iter().position(|l| !l.trim().is_empty());
        let last = lines.iter().rposition(|l| !l.trim().is_empty());
        scene.content = match (first, last) {
            (Some(first), Some(last)) => lines[first..=last].join("\n"),
            _ => String::new(),
        };

        if depth > 0 {
            self.warn(
                header.clone(),
                format!("scene `{}` has an unclosed `{{% if %}}` block", scene.id),
            );
        }
        let id = scene.id.clone();
        if self.doc.scenes.insert(scene).is_some() {
            self.warn(
                header,
                format!("duplicate scene id `{id}`; the later definition wins"),
            );
        }
    }

    fn finish(mut self) -> Vec<Diagnostic> {
        self.close_scene();
        if !self.functions.is_empty() {
            if !self.doc.functions.is_empty() {
                self.doc.functions.push('\n');
            }
            self.doc.functions.push_str(&self.functions.join("\n"));
        }
        self.diagnostics
    }
}

/// Recognize `=== name ===` and return the lowercased name.
fn section_header(trimmed: &str) -> Option<String> {
    if trimmed.len() < 6 || !trimmed.starts_with("===") || !trimmed.ends_with("===") {
        return None;
    }
    let name = trimmed.trim_matches(|c: char| c == '=' || c.is_whitespace());
    Some(name.to_lowercase())
}

/// Parse the part of an `@goto:` directive after the colon.
pub fn parse_goto(directive: &str) -> Option<AutoTransition> {
    let directive = directive.trim();
    let (target, text) = match directive.split_once(char::is_whitespace) {
        Some((target, text)) => (target, Some(text.trim())),
        None => (directive, None),
    };
    if target.is_empty() {
        return None;
    }
    Some(AutoTransition {
        target: target.to_string(),
        text: text.filter(|t| !t.is_empty()).map(str::to_string),
    })
}
