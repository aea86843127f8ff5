//! Checks for generated sources.
//!
//! [`CargoChecker`] writes generated Rust into a throwaway Cargo project and
//! runs `cargo check --message-format=json` on it, or, for faster feedback
//! without dependencies, hands a single file to `rustc` as a library crate
//! ([`CargoChecker::quick_check`]). [`check_wgsl`] performs
//! the structural checks shader output must pass before it is handed to the
//! GPU pipeline.

use std::borrow::Cow;
use std::fs;
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diagnostics::{parse_cargo_messages, parse_rustc_messages, Diagnostic, ValidationReport};
use crate::error::BuildError;

const CHECK_PACKAGE: &str = "weft_check";

/// Result of one `cargo check` or `rustc` run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub report: ValidationReport,
    pub stdout: String,
    pub stderr: String,
}

/// Runs `cargo check` on generated Rust source.
#[derive(Debug, Clone)]
pub struct CargoChecker {
    cargo: String,
    rustc: String,
    dependencies: Vec<(String, String)>,
}

impl Default for CargoChecker {
    fn default() -> Self {
        CargoChecker {
            cargo: "cargo".to_string(),
            rustc: "rustc".to_string(),
            dependencies: Vec::new(),
        }
    }
}

impl CargoChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a specific cargo binary instead of the one on `PATH`.
    pub fn with_cargo(mut self, cargo: impl Into<String>) -> Self {
        self.cargo = cargo.into();
        self
    }

    /// Uses a specific rustc binary for [`quick_check`](Self::quick_check).
    pub fn with_rustc(mut self, rustc: impl Into<String>) -> Self {
        self.rustc = rustc.into();
        self
    }

    /// Adds a `[dependencies]` entry to the scratch manifest.
    pub fn with_dependency(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.dependencies.push((name.into(), version.into()));
        self
    }

    /// The manifest written for each check.
    pub fn manifest(&self) -> String {
        let mut toml = format!(
            "[package]\nname = \"{}\"\nversion = \"0.1.0\"\nedition = \"2021\"\n\n[dependencies]\n",
            CHECK_PACKAGE
        );
        for (name, version) in &self.dependencies {
            toml.push_str(&format!("{} = \"{}\"\n", name, version));
        }
        toml
    }

    /// Checks `code` as the body of `src/main.rs`.
    ///
    /// Code without a `fn main` is wrapped in one. The scratch project is
    /// removed when the check returns.
    pub fn check(&self, code: &str) -> Result<CheckOutcome, BuildError> {
        let project = tempfile::Builder::new().prefix("weft-check-").tempdir()?;
        fs::write(project.path().join("Cargo.toml"), self.manifest())?;
        fs::create_dir_all(project.path().join("src"))?;
        fs::write(project.path().join("src").join("main.rs"), wrap_main(code).as_bytes())?;

        debug!(dir = %project.path().display(), "running cargo check");
        let output = Command::new(&self.cargo)
            .args(["check", "--message-format=json"])
            .current_dir(project.path())
            .output()?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let mut report = parse_cargo_messages(&stdout);

        // Non-zero exit without compiler errors: manifest or toolchain failure.
        if !output.status.success() && report.errors.is_empty() {
            let detail = stderr.trim();
            report.push(Diagnostic::error(if detail.is_empty() {
                format!("cargo check exited with {}", output.status)
            } else {
                detail.to_string()
            }));
        }

        Ok(CheckOutcome {
            report,
            stdout,
            stderr,
        })
    }

    /// Checks `code` as a standalone library crate with `rustc`.
    ///
    /// No `fn main` is required and no dependencies are available. Only
    /// metadata is emitted, into a scratch directory removed on return.
    pub fn quick_check(&self, code: &str) -> Result<CheckOutcome, BuildError> {
        let scratch = tempfile::Builder::new().prefix("weft-quick-").tempdir()?;
        let source = scratch.path().join("check.rs");
        fs::write(&source, code)?;

        debug!(file = %source.display(), "running rustc");
        let output = Command::new(&self.rustc)
            .args([
                "--crate-type=lib",
                "--error-format=json",
                "--emit=metadata",
            ])
            .arg(format!("--crate-name={}", CHECK_PACKAGE))
            .arg("--out-dir")
            .arg(scratch.path())
            .arg(&source)
            .output()?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let mut report = parse_rustc_messages(&stderr);
        if !output.status.success() && report.errors.is_empty() {
            report.push(Diagnostic::error(format!("rustc exited with {}", output.status)));
        }

        Ok(CheckOutcome {
            report,
            stdout,
            stderr,
        })
    }
}

/// Wraps `code` in `fn main` unless it already defines one.
pub fn wrap_main(code: &str) -> Cow<'_, str> {
    if code.contains("fn main") {
        Cow::Borrowed(code)
    } else {
        Cow::Owned(format!("fn main() {{\n{}\n}}", code))
    }
}

/// Returns true if `cargo --version` runs successfully.
pub fn is_cargo_available() -> bool {
    tool_available("cargo")
}

/// Returns true if `rustc --version` runs successfully.
pub fn is_rustc_available() -> bool {
    tool_available("rustc")
}

fn tool_available(tool: &str) -> bool {
    Command::new(tool)
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// WGSL
// ---------------------------------------------------------------------------

const STAGES: [&str; 3] = ["@compute", "@vertex", "@fragment"];

/// Structural checks for generated WGSL.
///
/// The shader must declare at least one entry point stage, every `@compute`
/// entry point must carry `@workgroup_size` before its `fn`, and braces must
/// balance.
pub fn check_wgsl(source: &str) -> ValidationReport {
    let mut report = ValidationReport::ok();

    if !STAGES.iter().any(|stage| source.contains(stage)) {
        report.push(Diagnostic::error(
            "no entry point: expected @compute, @vertex or @fragment",
        ));
    }

    for (pos, _) in source.match_indices("@compute") {
        let rest = &source[pos..];
        let attrs = rest.find("fn ").map_or(rest, |end| &rest[..end]);
        if !attrs.contains("@workgroup_size") {
            let (line, column) = location(source, pos);
            report.push(Diagnostic::error("missing @workgroup_size attribute").at(line, column));
        }
    }

    let mut depth: i64 = 0;
    for (pos, c) in source.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            let (line, column) = location(source, pos);
            report.push(Diagnostic::error("unmatched '}'").at(line, column));
            depth = 0;
        }
    }
    if depth > 0 {
        report.push(Diagnostic::error(format!("{} unclosed '{{'", depth)));
    }

    report
}

/// 1-based line and column of byte offset `pos`.
fn location(source: &str, pos: usize) -> (usize, usize) {
    let before = &source[..pos];
    let line = before.matches('\n').count() + 1;
    let column = before.rfind('\n').map_or(pos, |nl| pos - nl - 1) + 1;
    (line, column)
}
