//! Validation reports and compiler diagnostic parsing.
//!
//! [`ValidationReport`] is what a [`Validator`](crate::generate::Validator)
//! returns and what the validation cache stores. [`parse_cargo_messages`]
//! turns the line-delimited JSON printed by
//! `cargo check --message-format=json` into such a report;
//! [`parse_rustc_messages`] does the same for `rustc --error-format=json`.

use serde::{Deserialize, Serialize};

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Warning,
    Note,
    Help,
}

impl Level {
    /// Maps a compiler level string. Unrecognized levels count as errors.
    pub fn from_compiler(level: &str) -> Self {
        match level {
            "warning" => Level::Warning,
            "note" => Level::Note,
            "help" => Level::Help,
            _ => Level::Error,
        }
    }
}

/// A single error or warning with an optional source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Diagnostic {
    /// An error without location.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            level: Level::Error,
            message: message.into(),
            code: None,
            line: None,
            column: None,
            file: None,
        }
    }

    /// A warning without location.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            level: Level::Warning,
            ..Diagnostic::error(message)
        }
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }
}

/// Outcome of validating a graph or a generated source.
///
/// `valid` is true exactly when `errors` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        ValidationReport {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl ValidationReport {
    /// A passing report with no diagnostics.
    pub fn ok() -> Self {
        Self::default()
    }

    /// Sorts diagnostics into errors and warnings. Notes and help are
    /// dropped.
    pub fn from_diagnostics(diagnostics: impl IntoIterator<Item = Diagnostic>) -> Self {
        let mut report = ValidationReport::ok();
        for diagnostic in diagnostics {
            report.push(diagnostic);
        }
        report
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.level {
            Level::Error => {
                self.errors.push(diagnostic);
                self.valid = false;
            }
            Level::Warning => self.warnings.push(diagnostic),
            Level::Note | Level::Help => {}
        }
    }

    /// Appends every diagnostic of `other`.
    pub fn merge(&mut self, other: ValidationReport) {
        for diagnostic in other.errors.into_iter().chain(other.warnings) {
            self.push(diagnostic);
        }
    }
}

// ---------------------------------------------------------------------------
// cargo --message-format=json
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct CargoLine {
    #[serde(default)]
    reason: String,
    message: Option<CompilerMessage>,
}

#[derive(Deserialize)]
struct CompilerMessage {
    message: String,
    rendered: Option<String>,
    level: String,
    code: Option<CompilerCode>,
    #[serde(default)]
    spans: Vec<CompilerSpan>,
}

#[derive(Deserialize)]
struct CompilerCode {
    code: String,
}

#[derive(Deserialize)]
struct CompilerSpan {
    file_name: String,
    line_start: usize,
    column_start: usize,
    #[serde(default)]
    is_primary: bool,
}

/// Parses `cargo check --message-format=json` output.
///
/// Lines that are not JSON, or not compiler messages, are ignored. The
/// rendered text is preferred as the message; the location comes from the
/// primary span (or the first span if none is marked primary).
pub fn parse_cargo_messages(stdout: &str) -> ValidationReport {
    let diagnostics = stdout
        .lines()
        .filter_map(|line| serde_json::from_str::<CargoLine>(line).ok())
        .filter(|line| line.reason == "compiler-message" || line.reason.is_empty())
        .filter_map(|line| line.message)
        .map(CompilerMessage::into_diagnostic);
    ValidationReport::from_diagnostics(diagnostics)
}

/// Parses the stderr of `rustc --error-format=json`.
///
/// Each line is a bare compiler message; anything else is ignored.
pub fn parse_rustc_messages(stderr: &str) -> ValidationReport {
    let diagnostics = stderr
        .lines()
        .filter_map(|line| serde_json::from_str::<CompilerMessage>(line).ok())
        .map(CompilerMessage::into_diagnostic);
    ValidationReport::from_diagnostics(diagnostics)
}

impl CompilerMessage {
    fn into_diagnostic(self) -> Diagnostic {
        let span = self
            .spans
            .iter()
            .find(|s| s.is_primary)
            .or_else(|| self.spans.first());
        Diagnostic {
            level: Level::from_compiler(&self.level),
            code: self.code.map(|c| c.code),
            line: span.map(|s| s.line_start),
            column: span.map(|s| s.column_start),
            file: span.map(|s| s.file_name.clone()),
            message: self.rendered.unwrap_or(self.message),
        }
    }
}
