//! weft command-line tools.
//!
//! Provides the `weft` binary for inspecting workspace documents and
//! reference exports outside the editor:
//!
//! - `hash` prints the content hash of a saved document
//! - `imports` synthesizes the import statements for a reference export
//! - `check` runs `cargo check` (or, with `--quick`, `rustc`) on a `.rs`
//!   file or the shader checks on a `.wgsl` file
//! - `config` prints the effective cache configuration
//!
//! Machine-readable output goes to stdout as JSON; diagnostics go to stderr.
//! Log verbosity is controlled by `WEFT_LOG` (default `warn`).

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use weft_build::{
    check_wgsl, is_cargo_available, is_rustc_available, CacheConfig, CargoChecker,
    ValidationReport,
};
use weft_cache::{canonical_snapshot, hash_graph, hash_roots};
use weft_core::document::GraphDocument;
use weft_core::graph::ProgramGraph;
use weft_refs::ReferenceGraph;

/// Environment variable holding the log filter.
const LOG_VAR: &str = "WEFT_LOG";

/// weft workspace tools.
#[derive(Parser)]
#[command(name = "weft", about = "weft workspace tools")]
struct Cli {
    /// JSON cache configuration file; `WEFT_*` variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Print the content hash of a workspace document.
    Hash {
        /// Path to the document JSON.
        doc: PathBuf,

        /// Also print the canonical text the hash is computed from.
        #[arg(long)]
        canonical: bool,

        /// Also print one hash per root fragment.
        #[arg(long)]
        roots: bool,
    },

    /// Print the import statements synthesized from a reference export.
    Imports {
        /// Reference export JSON.
        refs: PathBuf,

        /// Workspace document the references point into.
        #[arg(short, long)]
        doc: PathBuf,

        /// Also report groups of files that reference each other.
        #[arg(long)]
        cycles: bool,
    },

    /// Check a generated `.rs` or `.wgsl` file.
    Check {
        /// Source file to check.
        file: PathBuf,

        /// Cargo binary to use for `.rs` files.
        #[arg(long, default_value = "cargo")]
        cargo: String,

        /// Extra dependency for the scratch crate, as `name=version`.
        #[arg(long = "dep")]
        deps: Vec<String>,

        /// Check a `.rs` file as a library with `rustc` instead of cargo.
        #[arg(long, conflicts_with = "deps")]
        quick: bool,
    },

    /// Print the effective cache configuration.
    Config,
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Hash {
            doc,
            canonical,
            roots,
        } => run_hash(&doc, canonical, roots),
        Commands::Imports { refs, doc, cycles } => run_imports(&refs, &doc, cycles),
        Commands::Check {
            file,
            cargo,
            deps,
            quick,
        } => run_check(&file, &cargo, &deps, quick),
        Commands::Config => run_config(cli.config.as_deref()),
    };
    process::exit(exit_code);
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Execute the hash subcommand.
///
/// Returns exit code: 0 = success, 1 = invalid document, 3 = I/O error.
fn run_hash(doc_path: &Path, canonical: bool, roots: bool) -> i32 {
    let graph = match load_graph(doc_path) {
        Ok(g) => g,
        Err(code) => return code,
    };

    let mut output = json!({
        "hash": hash_graph(&graph).to_string(),
        "nodes": graph.len(),
    });
    if canonical {
        output["canonical"] = json!(canonical_snapshot(&graph));
    }
    if roots {
        let per_root: serde_json::Map<String, serde_json::Value> = hash_roots(&graph)
            .into_iter()
            .map(|(id, hash)| (id.to_string(), json!(hash.to_string())))
            .collect();
        output["roots"] = serde_json::Value::Object(per_root);
    }
    print_json(&output);
    0
}

/// Execute the imports subcommand.
///
/// Skipped records are listed on stderr but do not fail the command.
/// Returns exit code: 0 = success, 1 = invalid input, 3 = I/O error.
fn run_imports(refs_path: &Path, doc_path: &Path, cycles: bool) -> i32 {
    let graph = match load_graph(doc_path) {
        Ok(g) => g,
        Err(code) => return code,
    };
    let text = match read_file(refs_path) {
        Ok(t) => t,
        Err(code) => return code,
    };

    let mut references = ReferenceGraph::new();
    let report = match references.import_references(&graph, &text) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: invalid reference export '{}': {}", refs_path.display(), e);
            return 1;
        }
    };
    for skip in &report.skipped {
        eprintln!("  - skipped record {}: {}", skip.index, skip.reason);
    }
    debug!(imported = report.imported, "reference export loaded");

    let mut output = json!({ "imports": references.generate_imports(None) });
    if cycles {
        output["cycles"] = json!(references.reference_cycles());
    }
    print_json(&output);
    0
}

/// Execute the check subcommand.
///
/// Returns exit code: 0 = valid, 1 = diagnostics reported or unsupported
/// input, 3 = I/O error or cargo not runnable.
fn run_check(path: &Path, cargo: &str, deps: &[String], quick: bool) -> i32 {
    let source = match read_file(path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let report = match path.extension().and_then(|e| e.to_str()) {
        Some("wgsl") => check_wgsl(&source),
        Some("rs") if quick => {
            if !is_rustc_available() {
                eprintln!("Error: rustc is not available on PATH");
                return 3;
            }
            match CargoChecker::new().quick_check(&source) {
                Ok(outcome) => outcome.report,
                Err(e) => {
                    eprintln!("Error: rustc failed to run: {}", e);
                    return 3;
                }
            }
        }
        Some("rs") => {
            let mut checker = CargoChecker::new().with_cargo(cargo);
            for dep in deps {
                match parse_dependency(dep) {
                    Ok((name, version)) => checker = checker.with_dependency(name, version),
                    Err(msg) => {
                        eprintln!("Error: {}", msg);
                        return 1;
                    }
                }
            }
            if cargo == "cargo" && !is_cargo_available() {
                eprintln!("Error: cargo is not available on PATH");
                return 3;
            }
            match checker.check(&source) {
                Ok(outcome) => outcome.report,
                Err(e) => {
                    eprintln!("Error: cargo check failed to run: {}", e);
                    return 3;
                }
            }
        }
        _ => {
            eprintln!(
                "Error: cannot check '{}': expected a .rs or .wgsl file",
                path.display()
            );
            return 1;
        }
    };

    print_report(&report);
    if report.valid {
        0
    } else {
        1
    }
}

/// Execute the config subcommand.
///
/// Returns exit code: 0 = success, 1 = invalid configuration, 3 = I/O error.
fn run_config(config_path: Option<&Path>) -> i32 {
    let base = match config_path {
        Some(path) => {
            let text = match read_file(path) {
                Ok(t) => t,
                Err(code) => return code,
            };
            match CacheConfig::from_json(&text) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("Error: invalid config '{}': {}", path.display(), e);
                    return 1;
                }
            }
        }
        None => CacheConfig::default(),
    };

    match base.overlay_env() {
        Ok(config) => {
            print_json(&config);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, i32> {
    fs::read_to_string(path).map_err(|e| {
        eprintln!("Error: failed to read '{}': {}", path.display(), e);
        3
    })
}

fn load_graph(path: &Path) -> Result<ProgramGraph, i32> {
    let text = read_file(path)?;
    GraphDocument::from_json(&text)
        .and_then(ProgramGraph::from_document)
        .map_err(|e| {
            eprintln!("Error: invalid document '{}': {}", path.display(), e);
            1
        })
}

/// Parses a `name=version` dependency argument.
fn parse_dependency(arg: &str) -> Result<(&str, &str), String> {
    match arg.split_once('=') {
        Some((name, version)) if !name.trim().is_empty() && !version.trim().is_empty() => {
            Ok((name.trim(), version.trim()))
        }
        _ => Err(format!(
            "invalid dependency '{}', expected name=version",
            arg
        )),
    }
}

fn print_report(report: &ValidationReport) {
    print_json(report);
    if !report.valid {
        eprintln!("Check failed with {} error(s):", report.errors.len());
        for err in &report.errors {
            eprintln!("  - {}", err.message);
        }
    }
}

fn print_json(value: &impl serde::Serialize) {
    let json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize output: {}\"}}", e));
    println!("{}", json);
}
