//! The [`Diagnostic`] record handed to sinks.
//!
//! A diagnostic is data, not text: the code and its named parameters are
//! what consumers match on. `message` is a convenience summary only.

use std::fmt;

use tern_ir::Span;

use crate::ErrorCode;

/// How serious a diagnostic is. Fixed by its code.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    /// `W` codes warn, everything else is an error.
    pub fn of(code: ErrorCode) -> Self {
        if code.is_warning() {
            Severity::Warning
        } else {
            Severity::Error
        }
    }

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

/// Whether a label marks the offending location or only points at
/// something related to it (a declaration, an earlier use).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum LabelRole {
    Primary,
    Related,
}

/// A span annotated with a short explanation.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Label {
    pub span: Span,
    pub role: LabelRole,
    pub text: String,
}

impl Label {
    pub fn is_primary(&self) -> bool {
        self.role == LabelRole::Primary
    }
}

/// One `key = value` pair, e.g. `expected = "i32"`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct DiagnosticParam {
    pub key: &'static str,
    pub value: String,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[must_use = "a diagnostic does nothing until it reaches a sink"]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub severity: Severity,
    pub message: String,
    /// In insertion order; keys are unique per code by convention.
    pub params: Vec<DiagnosticParam>,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Start a diagnostic for `code`; severity follows from the code.
    #[cold]
    pub fn new(code: ErrorCode) -> Self {
        Diagnostic {
            code,
            severity: Severity::of(code),
            message: String::new(),
            params: Vec::new(),
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn with_message(self, message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            ..self
        }
    }

    pub fn with_param(mut self, key: &'static str, value: impl Into<String>) -> Self {
        let value = value.into();
        self.params.push(DiagnosticParam { key, value });
        self
    }

    /// Mark the offending location.
    pub fn with_label(self, span: Span, text: impl Into<String>) -> Self {
        self.labelled(span, LabelRole::Primary, text.into())
    }

    /// Point at a location that explains the primary one.
    pub fn with_related(self, span: Span, text: impl Into<String>) -> Self {
        self.labelled(span, LabelRole::Related, text.into())
    }

    fn labelled(mut self, span: Span, role: LabelRole, text: String) -> Self {
        self.labels.push(Label { span, role, text });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        let found = self.params.iter().find(|p| p.key == key)?;
        Some(found.value.as_str())
    }

    /// Span of the first primary label, if any.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels
            .iter()
            .filter(|label| label.is_primary())
            .map(|label| label.span)
            .next()
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Single-line form for logs and test failures:
/// `E2024 error at 30..35: message {name = f}`.
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code.as_str())?;
        f.write_str(" ")?;
        f.write_str(self.severity.as_str())?;
        if let Some(span) = self.primary_span() {
            write!(f, " at {span:?}")?;
        }
        write!(f, ": {}", self.message)?;
        if !self.params.is_empty() {
            let rendered: Vec<String> = self
                .params
                .iter()
                .map(|p| format!("{} = {}", p.key, p.value))
                .collect();
            write!(f, " {{{}}}", rendered.join(", "))?;
        }
        Ok(())
    }
}
