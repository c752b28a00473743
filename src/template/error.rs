use std::fmt;
use thiserror::Error;

/// 1-based location in template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Errors raised while compiling template source.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("Parse error on {at}: {message}")]
    Parse { message: String, at: Position },

    #[error("Missing helper: \"{name}\" ({at})")]
    MissingHelper { name: String, at: Position },

    #[error("Unknown method \"{method}\" for {helper} ({at})")]
    UnknownMethod { helper: &'static str, method: String, at: Position },
}

impl TemplateError {
    pub fn position(&self) -> Position {
        match self {
            TemplateError::Parse { at, .. }
            | TemplateError::MissingHelper { at, .. }
            | TemplateError::UnknownMethod { at, .. } => *at,
        }
    }
}

impl From<handlebars::TemplateError> for TemplateError {
    fn from(e: handlebars::TemplateError) -> Self {
        let (line, column) = e.pos().unwrap_or((1, 1));
        TemplateError::Parse { message: e.reason().to_string(), at: Position { line, column } }
    }
}

/// What a failed render produces instead of text.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct Diagnostic {
    pub message: String,
    pub trace: String,
}

impl Diagnostic {
    /// The inline form substituted for the rendered output.
    pub fn to_inline(&self) -> String {
        format!("<h4>{}</h4><pre>{}</pre>", self.message, self.trace)
    }
}

impl From<TemplateError> for Diagnostic {
    fn from(e: TemplateError) -> Self {
        Self { trace: format!("    at compile ({})", e.position()), message: e.to_string() }
    }
}

impl From<handlebars::RenderError> for Diagnostic {
    fn from(e: handlebars::RenderError) -> Self {
        let trace = match (e.line_no, e.column_no) {
            (Some(line), Some(column)) => format!("    at {}", Position { line, column }),
            _ => String::new(),
        };
        Self { message: e.reason().to_string(), trace }
    }
}
