//! Compiler-style diagnostics for artifact validation.
//!
//! Spans are byte ranges into the artifact's JSON source; diagnostics for
//! an in-memory artifact carry none and render as the message alone.

use std::fmt;
use std::ops::Range;

use ariadne::{Color, Label, Report, ReportKind, Source};

/// Byte range into a JSON document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The range clipped to a source of `len` bytes.
    fn clipped(self, len: usize) -> Range<usize> {
        let start = self.start.min(len);
        start..self.end.clamp(start, len)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    fn label(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }

    fn style(self) -> (ReportKind<'static>, Color) {
        match self {
            Severity::Error => (ReportKind::Error, Color::Red),
            Severity::Warning => (ReportKind::Warning, Color::Yellow),
        }
    }
}

/// Trailing remark attached to a diagnostic, rendered in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Annotation {
    Note(String),
    Help(String),
}

/// A validation finding, optionally pointing into the artifact source.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// `None` when the artifact was checked in memory.
    pub span: Option<Span>,
    pub annotations: Vec<Annotation>,
}

impl Diagnostic {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            span: None,
            annotations: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn at(mut self, span: Option<Span>) -> Self {
        self.span = span;
        self
    }

    pub fn note(mut self, text: impl Into<String>) -> Self {
        self.annotations.push(Annotation::Note(text.into()));
        self
    }

    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.annotations.push(Annotation::Help(text.into()));
        self
    }

    /// Print to stderr with the offending JSON underlined. Falls back to
    /// the plain form when ariadne cannot write.
    pub fn render(&self, filename: &str, source: &str) {
        let (kind, color) = self.severity.style();
        let range = self.span.map(|span| span.clipped(source.len()));
        let offset = range.as_ref().map_or(0, |r| r.start);

        let mut report = Report::build(kind, filename, offset).with_message(&self.message);
        if let Some(range) = range {
            report = report.with_label(Label::new((filename, range)).with_color(color));
        }
        for annotation in &self.annotations {
            report = match annotation {
                Annotation::Note(text) => report.with_note(text),
                Annotation::Help(text) => report.with_help(text),
            };
        }

        if report.finish().eprint((filename, Source::from(source))).is_err() {
            eprintln!("{}", self);
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity.label(), self.message)?;
        for annotation in &self.annotations {
            match annotation {
                Annotation::Note(text) => write!(f, "\n  note: {}", text)?,
                Annotation::Help(text) => write!(f, "\n  help: {}", text)?,
            }
        }
        Ok(())
    }
}

pub fn render_diagnostics(diagnostics: &[Diagnostic], filename: &str, source: &str) {
    for diag in diagnostics {
        diag.render(filename, source);
    }
}

/// Locate the value of the `n`-th occurrence of `"key":` in a JSON text.
///
/// Artifacts contain no string values, so a plain scan for the quoted key
/// cannot be fooled by string contents.
pub fn locate_key(source: &str, key: &str, n: usize) -> Option<Span> {
    let needle = format!("\"{}\"", key);
    let (start, _) = source.match_indices(&needle).nth(n)?;
    let rest = &source[start..];
    let end = rest
        .find([',', '}', ']'])
        .map(|i| start + i)
        .unwrap_or(source.len());
    Some(Span::new(start, source[..end].trim_end().len()))
}

/// Locate the `n`-th occurrence of the quoted key itself.
pub fn locate_name(source: &str, key: &str, n: usize) -> Option<Span> {
    let needle = format!("\"{}\"", key);
    let (start, _) = source.match_indices(&needle).nth(n)?;
    Some(Span::new(start, start + needle.len()))
}
