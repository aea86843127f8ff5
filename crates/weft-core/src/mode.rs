//! Sub-language modes and mode classification.
//!
//! Fragments and target files belong to one of the editor's sub-languages.
//! Which one is decided by a [`ModeClassifier`]: a pure strategy from a node
//! kind or a file name to a [`Mode`]. [`HeuristicClassifier`] is the default
//! prefix/substring matcher and can be swapped without touching the graph,
//! cache, or reference logic.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A sub-language a fragment or file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// The systems language.
    Rust,
    /// The shader language.
    Wgsl,
    /// The entity-component framework.
    Bevy,
    /// Classification failed.
    Unknown,
}

impl Mode {
    /// All classifiable modes, in display order.
    pub const KNOWN: [Mode; 3] = [Mode::Rust, Mode::Wgsl, Mode::Bevy];

    /// Lowercase name used in documents and toolbox keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Rust => "rust",
            Mode::Wgsl => "wgsl",
            Mode::Bevy => "bevy",
            Mode::Unknown => "unknown",
        }
    }

    /// The file generated code for this mode lands in.
    pub fn default_file(self) -> &'static str {
        match self {
            Mode::Rust => "main.rs",
            Mode::Wgsl => "shader.wgsl",
            Mode::Bevy => "bevy_app.rs",
            Mode::Unknown => "generated.txt",
        }
    }

    /// Whether this mode compiles as Rust source (plain or framework).
    pub fn is_rust_family(self) -> bool {
        matches!(self, Mode::Rust | Mode::Bevy)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rust" => Ok(Mode::Rust),
            "wgsl" => Ok(Mode::Wgsl),
            "bevy" => Ok(Mode::Bevy),
            "unknown" => Ok(Mode::Unknown),
            other => Err(format!("unknown mode '{}'", other)),
        }
    }
}

/// Strategy deciding which sub-language a kind or file belongs to.
pub trait ModeClassifier {
    /// Classifies a node by its schema kind.
    fn mode_of_kind(&self, kind: &str) -> Mode;

    /// Classifies a target file by its name.
    fn mode_of_file(&self, file: &str) -> Mode;
}

/// Default classifier: kind prefixes and file-name substrings.
///
/// Kinds are matched on their `rust_`, `wgsl_`/`shader_`, and `bevy_`
/// prefixes. File names are matched case-insensitively: a `.wgsl` extension
/// or a name containing `shader` is WGSL, a name containing `bevy` is Bevy,
/// any other `.rs` file is Rust.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicClassifier;

impl ModeClassifier for HeuristicClassifier {
    fn mode_of_kind(&self, kind: &str) -> Mode {
        if kind.starts_with("rust_") {
            Mode::Rust
        } else if kind.starts_with("wgsl_") || kind.starts_with("shader_") {
            Mode::Wgsl
        } else if kind.starts_with("bevy_") {
            Mode::Bevy
        } else {
            Mode::Unknown
        }
    }

    fn mode_of_file(&self, file: &str) -> Mode {
        let name = file.to_ascii_lowercase();
        if name.ends_with(".wgsl") || name.contains("shader") {
            Mode::Wgsl
        } else if name.contains("bevy") {
            Mode::Bevy
        } else if name.ends_with(".rs") {
            Mode::Rust
        } else {
            Mode::Unknown
        }
    }
}
