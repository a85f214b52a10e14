//! Problems found while reading story files.
//!
//! Story parsing never stops at a bad line. Each problem is recorded as a
//! [`Diagnostic`] with a byte span into the file it came from, and
//! `tadv check` renders them with ariadne.

use std::fmt;
use std::ops::Range;

use ariadne::{Color, Label, Report, ReportKind, Source};

/// How serious a diagnostic is. Only errors fail `tadv check`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The story cannot be played as written.
    Error,
    /// Something was skipped or looks wrong, but play can continue.
    Warning,
}

impl Severity {
    fn report_kind(self) -> ReportKind<'static> {
        match self {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
        }
    }

    fn color(self) -> Color {
        match self {
            Severity::Error => Color::Red,
            Severity::Warning => Color::Yellow,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        })
    }
}

/// A problem in story source, pointing at the line that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Error or warning.
    pub severity: Severity,
    /// Byte range in the source file.
    pub span: Range<usize>,
    /// One-line description.
    pub message: String,
    /// Short note shown under the span. Falls back to `message`.
    pub label: Option<String>,
}

impl Diagnostic {
    fn new(severity: Severity, span: Range<usize>, message: impl Into<String>) -> Self {
        Self {
            severity,
            span,
            message: message.into(),
            label: None,
        }
    }

    /// An error: the offending unit was skipped and the story is broken.
    pub fn error(span: Range<usize>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, span, message)
    }

    /// A warning: the offending line was ignored.
    pub fn warning(span: Range<usize>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, span, message)
    }

    /// Attach a note shown under the span.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Whether this diagnostic fails the check.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// 1-based line of the span start within `source`.
    pub fn line_number(&self, source: &str) -> usize {
        let end = self.span.start.min(source.len());
        source.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
    }

    /// Span clamped to `source`, so a stale range never points past the end.
    fn clamped_span(&self, source: &str) -> Range<usize> {
        let end = self.span.end.min(source.len());
        self.span.start.min(end)..end
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Render one file's diagnostics as ariadne reports.
pub fn render_diagnostics(source: &str, filename: &str, diagnostics: &[Diagnostic]) -> String {
    let mut output = Vec::new();

    for diag in diagnostics {
        let span = (filename, diag.clamped_span(source));
        let label = Label::new(span.clone())
            .with_message(diag.label.as_deref().unwrap_or(&diag.message))
            .with_color(diag.severity.color());

        let written = Report::build(diag.severity.report_kind(), span)
            .with_message(&diag.message)
            .with_label(label)
            .finish()
            .write((filename, Source::from(source)), &mut output);
        if let Err(error) = written {
            tracing::debug!(%error, "could not render diagnostic");
        }
    }

    String::from_utf8_lossy(&output).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_display() {
        let d = Diagnostic::error(0..5, "malformed scene header");
        assert_eq!(d.to_string(), "error: malformed scene header");
        assert!(d.is_error());
        assert!(!Diagnostic::warning(0..1, "x").is_error());
    }

    #[test]
    fn line_number_counts_from_one() {
        let source = "---start: Start\nHi.\n* Go -> goto:\n";
        assert_eq!(Diagnostic::warning(0..3, "x").line_number(source), 1);
        assert_eq!(Diagnostic::warning(20..33, "x").line_number(source), 3);
        assert_eq!(Diagnostic::warning(500..501, "x").line_number(source), 4);
    }

    #[test]
    fn render_produces_output() {
        let source = "---start: Start\n* Go -> goto:\n";
        let diags = vec![
            Diagnostic::warning(16..29, "choice has an empty goto target")
                .with_label("expected a scene id after `goto:`"),
        ];
        let output = render_diagnostics(source, "test.tadv", &diags);
        assert!(output.contains("choice has an empty goto target"));
        assert!(output.contains("expected a scene id"));
    }

    #[test]
    fn render_tolerates_out_of_range_spans() {
        let diags = vec![Diagnostic::error(40..90, "past the end")];
        let output = render_diagnostics("short", "x.tadv", &diags);
        assert!(output.contains("past the end"));
    }
}
