use std::{fmt::Display, path::Path};
use codespan_reporting::diagnostic::{Label as CodespanLabel, LabelStyle, Severity as CodespanSeverity};
use codespan_reporting::files::SimpleFiles;
use termcolor::Buffer;
use super::src_span::SrcSpan;

/// The pipeline phase a diagnostic originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Lexical,
    Syntax,
    Semantic,
    Runtime,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self {
            Self::Lexical => "lexical",
            Self::Syntax => "syntax",
            Self::Semantic => "semantic",
            Self::Runtime => "runtime",
        };

        write!(f, "{severity}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub text: Option<String>,
    pub span: SrcSpan
}

impl Label {
    pub fn to_codespan_label(&self, file_id: usize, label_style: Option<LabelStyle>) -> CodespanLabel<usize> {
        let label = CodespanLabel::new(
            label_style.unwrap_or(LabelStyle::Primary),
            file_id,
            (self.span.start as usize)..(self.span.end as usize),
        );

        match &self.text {
            None => label,
            Some(text) => label.with_message(text.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub level: Level,
    pub message: String,
    pub label: Label,
    pub extra_labels: Vec<Label>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(severity: Severity, span: SrcSpan, message: impl Into<String>) -> Self {
        Self {
            severity,
            level: Level::Error,
            message: message.into(),
            label: Label { text: None, span },
            extra_labels: vec![],
            notes: vec![],
        }
    }

    pub fn warning(severity: Severity, span: SrcSpan, message: impl Into<String>) -> Self {
        Self {
            level: Level::Warning,
            ..Self::error(severity, span, message)
        }
    }

    pub fn with_label(mut self, text: impl Into<String>) -> Self {
        self.label.text = Some(text.into());
        self
    }

    pub fn with_extra_label(mut self, span: SrcSpan, text: impl Into<String>) -> Self {
        self.extra_labels.push(Label { text: Some(text.into()), span });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn span(&self) -> SrcSpan {
        self.label.span
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }

    /// Renders the diagnostic with a source excerpt.
    pub fn write(&self, path: &Path, src: &str, buf: &mut Buffer) {
        let mut files = SimpleFiles::new();
        let file_id = files.add(path.display().to_string(), src);

        let source_len = src.len() as u32;
        let clamp = |label: &Label| {
            let mut label = label.clone();
            label.span.start = label.span.start.min(source_len);
            label.span.end = label.span.end.min(source_len).max(label.span.start);
            label
        };

        let mut labels = vec![clamp(&self.label).to_codespan_label(file_id, None)];

        self.extra_labels.iter()
            .for_each(|label| {
                labels.push(clamp(label).to_codespan_label(file_id, Some(LabelStyle::Secondary)))
            });

        let severity = match self.level {
            Level::Error => CodespanSeverity::Error,
            Level::Warning => CodespanSeverity::Warning,
        };

        let diagnostic = codespan_reporting::diagnostic::Diagnostic::new(severity)
            .with_message(format!("{} ({})", self.message, self.severity))
            .with_labels(labels)
            .with_notes(self.notes.clone());

        let config = codespan_reporting::term::Config::default();
        if codespan_reporting::term::emit(buf, &config, &files, &diagnostic).is_err() {
            self.write_title(buf);
        }
    }

    pub fn write_title(&self, buf: &mut Buffer) {
        use std::io::Write;
        use termcolor::{Color, ColorSpec, WriteColor};

        let colour = match self.level {
            Level::Error => Color::Red,
            Level::Warning => Color::Yellow,
        };

        let _ = buf.set_color(ColorSpec::new().set_bold(true).set_fg(Some(colour)));
        let _ = write!(buf, "[{} {}]", self.severity, self.label.span);
        let _ = buf.set_color(ColorSpec::new().set_bold(true));
        let _ = writeln!(buf, " {}", self.message);
        let _ = buf.set_color(&ColorSpec::new());

        for note in &self.notes {
            let _ = writeln!(buf, "  = {note}");
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let span = self.label.span;

        match self.level {
            Level::Error => write!(f, "[{} L{}:{}] {}", self.severity, span.line, span.column, self.message),
            Level::Warning => write!(f, "[{} L{}:{}] warning: {}", self.severity, span.line, span.column, self.message),
        }
    }
}
