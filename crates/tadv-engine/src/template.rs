//! Render-time processing of scene text.
//!
//! Rendering runs in a fixed order: conditional blocks, then `{{ }}`
//! interpolation, then extraction of `@goto` directives and `*` choice
//! lines from whatever text survived.

use std::ops::Range;

use tadv_core::{AutoTransition, Choice};
use tadv_dsl::expr::{Scope, eval_condition, eval_str, split_format};
use tadv_dsl::{is_choice_line, parse_choice_line, parse_goto};

/// The result of rendering one scene body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rendered {
    /// Display text with directives and choice lines removed.
    pub text: String,
    /// Choices found in the rendered text, in order.
    pub choices: Vec<Choice>,
    /// The last surviving `@goto`, if any.
    pub auto_transition: Option<AutoTransition>,
}

#[derive(Debug, Clone, PartialEq)]
enum TagKind {
    If(String),
    Elif(String),
    Else,
    Endif,
}

#[derive(Debug, Clone)]
struct Tag {
    kind: TagKind,
    /// Bytes to remove when the tag is consumed. Covers the whole line when
    /// the tag stands alone on it.
    span: Range<usize>,
}

fn classify(inner: &str) -> Option<TagKind> {
    let inner = inner.trim();
    let (word, rest) = inner
        .split_once(char::is_whitespace)
        .map_or((inner, ""), |(w, r)| (w, r.trim()));
    match (word, rest.is_empty()) {
        ("if", false) => Some(TagKind::If(rest.to_string())),
        ("elif", false) => Some(TagKind::Elif(rest.to_string())),
        ("else", true) => Some(TagKind::Else),
        ("endif", true) => Some(TagKind::Endif),
        _ => None,
    }
}

/// Widen `tag` to its whole line when nothing else shares the line.
fn standalone_span(text: &str, tag: Range<usize>) -> Range<usize> {
    let line_start = text[..tag.start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = text[tag.end..].find('\n').map(|i| tag.end + i);
    let before_blank = text[line_start..tag.start].trim().is_empty();
    match line_end {
        Some(end) if before_blank && text[tag.end..end].trim().is_empty() => line_start..end + 1,
        None if before_blank && text[tag.end..].trim().is_empty() => line_start..text.len(),
        _ => tag,
    }
}

fn scan_tags(text: &str) -> Vec<Tag> {
    let mut tags = Vec::new();
    let mut pos = 0;
    while let Some(found) = text[pos..].find("{%") {
        let start = pos + found;
        let Some(close) = text[start + 2..].find("%}") else {
            break;
        };
        let end = start + 2 + close + 2;
        if let Some(kind) = classify(&text[start + 2..end - 2]) {
            tags.push(Tag {
                kind,
                span: standalone_span(text, start..end),
            });
        }
        pos = end;
    }
    tags
}

/// Find the first block with no nested blocks inside it.
///
/// Returns the indices of its tags, `if` first and `endif` last.
fn innermost_block(tags: &[Tag]) -> Option<Vec<usize>> {
    let mut open: Vec<usize> = Vec::new();
    for (i, tag) in tags.iter().enumerate() {
        match tag.kind {
            TagKind::If(_) => open.push(i),
            TagKind::Endif => {
                if let Some(start) = open.pop() {
                    let block = (start..=i)
                        .filter(|&j| {
                            j == start
                                || j == i
                                || matches!(tags[j].kind, TagKind::Elif(_) | TagKind::Else)
                        })
                        .collect();
                    return Some(block);
                }
            }
            _ => {}
        }
    }
    None
}

/// Renders scene text against an expression scope.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateProcessor;

impl TemplateProcessor {
    /// Create a processor.
    pub fn new() -> Self {
        Self
    }

    /// Render a scene body and pull out its dynamic choices and `@goto`.
    pub fn render(&self, raw: &str, scope: &dyn Scope) -> Rendered {
        let text = self.render_text(raw, scope);

        let mut kept = Vec::new();
        let mut choices = Vec::new();
        let mut auto_transition = None;
        for line in text.lines() {
            let trimmed = line.trim();
            if let Some(directive) = trimmed.strip_prefix("@goto:") {
                match parse_goto(directive) {
                    Some(goto) => auto_transition = Some(goto),
                    None => tracing::warn!(line = trimmed, "ignoring `@goto:` without a scene"),
                }
                continue;
            }
            if is_choice_line(trimmed) {
                match parse_choice_line(trimmed) {
                    Ok(choice) => choices.push(choice),
                    Err(error) => tracing::warn!(line = trimmed, %error, "dropping choice line"),
                }
                continue;
            }
            kept.push(line);
        }

        let first = kept.iter().position(|l| !l.trim().is_empty());
        let last = kept.iter().rposition(|l| !l.trim().is_empty());
        let text = match (first, last) {
            (Some(first), Some(last)) => kept[first..=last].join("\n"),
            _ => String::new(),
        };

        Rendered {
            text,
            choices,
            auto_transition,
        }
    }

    /// Resolve conditionals and interpolations only. Used for choice text.
    pub fn render_text(&self, raw: &str, scope: &dyn Scope) -> String {
        let text = self.resolve_conditionals(raw, scope);
        self.interpolate(&text, scope)
    }

    fn resolve_conditionals(&self, raw: &str, scope: &dyn Scope) -> String {
        let mut text = raw.to_string();
        loop {
            let tags = scan_tags(&text);
            let Some(block) = innermost_block(&tags) else {
                return text;
            };

            let mut chosen: Option<Range<usize>> = None;
            for pair in block.windows(2) {
                let (tag, next) = (&tags[pair[0]], &tags[pair[1]]);
                let body = tag.span.end..next.span.start;
                let taken = match &tag.kind {
                    TagKind::If(cond) | TagKind::Elif(cond) => self.condition(cond, scope),
                    TagKind::Else => true,
                    TagKind::Endif => false,
                };
                if taken {
                    chosen = Some(body);
                    break;
                }
            }

            let first = &tags[block[0]];
            let last = &tags[block[block.len() - 1]];
            let replacement = chosen.map(|r| text[r].to_string()).unwrap_or_default();
            text.replace_range(first.span.start..last.span.end, &replacement);
        }
    }

    fn condition(&self, source: &str, scope: &dyn Scope) -> bool {
        match eval_condition(source, scope) {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(condition = source, %error, "condition failed; treating as false");
                false
            }
        }
    }

    fn interpolate(&self, text: &str, scope: &dyn Scope) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find("{{") {
            let Some(len) = rest[start + 2..].find("}}") else {
                break;
            };
            out.push_str(&rest[..start]);
            let inner = &rest[start + 2..start + 2 + len];
            out.push_str(&self.interpolation(inner, scope));
            rest = &rest[start + 2 + len + 2..];
        }
        out.push_str(rest);
        out
    }

    fn interpolation(&self, inner: &str, scope: &dyn Scope) -> String {
        let (expr, spec) = split_format(inner);
        match eval_str(expr, scope) {
            Ok(value) => spec
                .and_then(|s| s.apply(&value))
                .unwrap_or_else(|| value.to_string()),
            Err(error) => {
                tracing::warn!(expression = expr, %error, "interpolation failed");
                format!("{{Error: {error}}}")
            }
        }
    }
}
