//! External collaborator seams.
//!
//! The code generator and the validator live outside this workspace. Both
//! are pure functions of their inputs from the caches' point of view: the
//! workspace only calls them on a miss and stores whatever they return.

use std::collections::BTreeMap;

use weft_core::graph::ProgramGraph;
use weft_refs::ImportMap;

use crate::diagnostics::ValidationReport;
use crate::error::BuildError;

/// File name -> generated text.
pub type GeneratedFiles = BTreeMap<String, String>;

/// Turns a program graph into source files.
///
/// `imports` is the synthesized import map for the current references;
/// generators typically hand it to [`prepend_imports`].
pub trait CodeGenerator {
    fn generate(&self, graph: &ProgramGraph, imports: &ImportMap)
        -> Result<GeneratedFiles, BuildError>;
}

/// Checks a program graph, e.g. against naming conventions.
pub trait Validator {
    fn validate(&self, graph: &ProgramGraph) -> Result<ValidationReport, BuildError>;
}

impl<T: CodeGenerator + ?Sized> CodeGenerator for &T {
    fn generate(
        &self,
        graph: &ProgramGraph,
        imports: &ImportMap,
    ) -> Result<GeneratedFiles, BuildError> {
        (**self).generate(graph, imports)
    }
}

impl<T: Validator + ?Sized> Validator for &T {
    fn validate(&self, graph: &ProgramGraph) -> Result<ValidationReport, BuildError> {
        (**self).validate(graph)
    }
}

/// Accepts every graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl Validator for AcceptAll {
    fn validate(&self, _graph: &ProgramGraph) -> Result<ValidationReport, BuildError> {
        Ok(ValidationReport::ok())
    }
}

/// Prepends each file's import statements, followed by a blank line.
///
/// Files with imports but no generated text are created.
pub fn prepend_imports(files: &mut GeneratedFiles, imports: &ImportMap) {
    for (file, statements) in imports {
        if statements.is_empty() {
            continue;
        }
        let body = files.entry(file.clone()).or_default();
        let mut header = statements.join("\n");
        header.push('\n');
        if !body.is_empty() {
            header.push('\n');
        }
        body.insert_str(0, &header);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepend_imports() {
        let mut files = GeneratedFiles::new();
        files.insert("main.rs".into(), "fn main() {}\n".into());
        files.insert("shader.wgsl".into(), "@compute @workgroup_size(1) fn cs() {}\n".into());

        let mut imports = ImportMap::new();
        imports.insert(
            "main.rs".into(),
            vec![
                "use crate::physics::Body;".into(),
                "// shader reference: shader.wgsl".into(),
            ],
        );
        imports.insert("bevy_app.rs".into(), vec!["use crate::components::*;".into()]);
        imports.insert("shader.wgsl".into(), vec![]);

        prepend_imports(&mut files, &imports);

        insta::assert_snapshot!(files["main.rs"].trim_end(), @r"
        use crate::physics::Body;
        // shader reference: shader.wgsl

        fn main() {}
        ");
        assert_eq!(files["bevy_app.rs"], "use crate::components::*;\n");
        assert_eq!(files["shader.wgsl"], "@compute @workgroup_size(1) fn cs() {}\n");
    }

    struct NodeCount;

    impl CodeGenerator for NodeCount {
        fn generate(
            &self,
            graph: &ProgramGraph,
            _imports: &ImportMap,
        ) -> Result<GeneratedFiles, BuildError> {
            let mut files = GeneratedFiles::new();
            files.insert("main.rs".into(), format!("// {} nodes", graph.len()));
            Ok(files)
        }
    }

    #[test]
    fn test_borrowed_collaborators() {
        let generator = NodeCount;
        let by_ref: &dyn CodeGenerator = &generator;
        let files = (&by_ref)
            .generate(&ProgramGraph::new(), &ImportMap::new())
            .unwrap();
        assert_eq!(files["main.rs"], "// 0 nodes");
        assert!((&AcceptAll).validate(&ProgramGraph::new()).unwrap().valid);
    }
}
