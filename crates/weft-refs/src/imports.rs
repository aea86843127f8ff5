//! Import/use statement synthesis.
//!
//! Each reference becomes one statement in the default source file of its
//! source mode. The statement is picked by a fixed rule table over
//! `(source_mode, target_mode, target_file, target_symbol)`:
//!
//! | Pairing                    | Symbol | Statement                         |
//! |----------------------------|--------|-----------------------------------|
//! | same mode                  | yes    | `use <module>::<symbol>;`         |
//! | same mode                  | no     | `use <module>::*;`                |
//! | cross, target is WGSL      | any    | `// shader reference: <file>`     |
//! | cross, other target        | yes    | `use <module>::<symbol>;`         |
//! | cross, other target        | no     | `// reference: <file>`            |
//!
//! Host languages cannot import shader source, hence the comment marker.

use std::collections::BTreeMap;

use indexmap::IndexSet;

use weft_core::mode::Mode;

use crate::reference::Reference;

/// Source file name -> unique statements in first-seen order.
///
/// Files iterate in name order, so the map renders identically every time.
pub type ImportMap = BTreeMap<String, Vec<String>>;

/// Builds the import map for `references`.
pub(crate) fn generate<'a>(references: impl IntoIterator<Item = &'a Reference>) -> ImportMap {
    let mut files: BTreeMap<String, IndexSet<String>> = BTreeMap::new();
    for reference in references {
        files
            .entry(reference.source_mode.default_file().to_string())
            .or_default()
            .insert(import_statement(reference));
    }
    files
        .into_iter()
        .map(|(file, statements)| (file, statements.into_iter().collect()))
        .collect()
}

/// The statement a single reference contributes.
pub fn import_statement(reference: &Reference) -> String {
    let symbol = reference.target_symbol.as_deref().and_then(symbol_path);
    let symbol = symbol.as_deref();
    if reference.source_mode == reference.target_mode {
        let module = module_path(&reference.target_file);
        return match symbol {
            Some(symbol) => format!("use {}::{};", module, symbol),
            None => format!("use {}::*;", module),
        };
    }
    match (reference.target_mode, symbol) {
        (Mode::Wgsl, _) => format!("// shader reference: {}", reference.target_file),
        (_, Some(symbol)) => format!("use {}::{};", module_path(&reference.target_file), symbol),
        (_, None) => format!("// reference: {}", reference.target_file),
    }
}

/// Derives a `crate::`-rooted module path from a target file path.
///
/// `src/physics/body.rs` -> `crate::physics::body`,
/// `src/net/mod.rs` -> `crate::net`, `main.rs` -> `crate`.
pub fn module_path(target_file: &str) -> String {
    let mut segments: Vec<&str> = target_file
        .split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect();

    if let Some(last) = segments.last_mut() {
        if let Some((stem, _ext)) = last.rsplit_once('.') {
            if !stem.is_empty() {
                *last = stem;
            }
        }
    }
    if segments.len() > 1 && segments[0] == "src" {
        segments.remove(0);
    }
    if matches!(segments.last(), Some(&("mod" | "lib" | "main"))) {
        segments.pop();
    }

    let mut path = String::from("crate");
    for segment in segments {
        path.push_str("::");
        push_ident(&mut path, segment);
    }
    path
}

/// Sanitizes a possibly `::`-qualified symbol into a path suffix.
///
/// Returns `None` if nothing usable is left, in which case the reference is
/// treated as symbol-less.
fn symbol_path(symbol: &str) -> Option<String> {
    let mut path = String::new();
    for segment in symbol.split("::").map(str::trim).filter(|s| !s.is_empty()) {
        if !path.is_empty() {
            path.push_str("::");
        }
        push_ident(&mut path, segment);
    }
    (!path.is_empty()).then_some(path)
}

/// Appends `segment` as an identifier: non-identifier characters become `_`
/// and a leading digit is prefixed with `_`.
fn push_ident(path: &mut String, segment: &str) {
    if segment.starts_with(|c: char| c.is_ascii_digit()) {
        path.push('_');
    }
    path.extend(
        segment
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' }),
    );
}
