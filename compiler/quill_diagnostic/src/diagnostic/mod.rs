//! Recoverable problems found while compiling grammar strings, publishing
//! declarations or assembling triggers.
//!
//! A [`Diagnostic`] usually points into one grammar string: `source` holds the
//! text and each [`Label`] underlines a byte range of it.

use std::fmt;

use crate::{ErrorCode, Span};

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    /// The declaration or statement is dropped.
    Error,
    /// Reported, nothing is dropped.
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An underlined range of the diagnostic's source text.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Label {
    pub span: Span,
    pub text: String,
    /// `false` for ranges shown only as context.
    pub culprit: bool,
}

impl Label {
    fn underline(&self) -> String {
        let mark = if self.culprit { "^" } else { "-" };
        let width = self.span.len().max(1) as usize;
        format!("{}{} {}", " ".repeat(self.span.start as usize), mark.repeat(width), self.text)
    }
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[must_use = "a diagnostic is lost unless it is queued or returned"]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub severity: Severity,
    /// Empty means "use the code's description".
    pub message: String,
    /// Grammar string the labels point into.
    pub source: Option<String>,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    #[cold]
    pub fn error(code: ErrorCode) -> Self {
        Diagnostic {
            code,
            severity: Severity::Error,
            message: String::new(),
            source: None,
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    #[cold]
    pub fn warning(code: ErrorCode) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            ..Diagnostic::error(code)
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Underline the offending range.
    pub fn with_label(mut self, span: Span, text: impl Into<String>) -> Self {
        self.labels.push(Label {
            span,
            text: text.into(),
            culprit: true,
        });
        self
    }

    /// Underline a range that explains the offending one.
    pub fn with_context_label(mut self, span: Span, text: impl Into<String>) -> Self {
        self.labels.push(Label {
            span,
            text: text.into(),
            culprit: false,
        });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// The message, or the code's description when none was set.
    pub fn headline(&self) -> &str {
        if self.message.is_empty() {
            self.code.description()
        } else {
            &self.message
        }
    }

    /// Range of the first culprit label.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels.iter().find(|l| l.culprit).map(|l| l.span)
    }

    /// The source text under [`Diagnostic::primary_span`].
    pub fn primary_snippet(&self) -> Option<&str> {
        let span = self.primary_span()?;
        self.source
            .as_deref()?
            .get(span.start as usize..span.end as usize)
    }
}

/// ```text
/// error[E1001]: unclosed optional group
///   --> `say [hello`
///           ^ opened here
///   = note: ...
/// ```
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.headline())?;
        if let Some(source) = &self.source {
            write!(f, "\n  --> `{source}`")?;
            for label in &self.labels {
                // Aligns with the opening backtick.
                write!(f, "\n       {}", label.underline())?;
            }
        }
        self.notes
            .iter()
            .try_for_each(|note| write!(f, "\n  = note: {note}"))
    }
}
