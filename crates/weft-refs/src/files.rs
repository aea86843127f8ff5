//! File-level view of the reference overlay.
//!
//! Collapses references into edges between files: the default source file
//! of the reference's source mode points at its target file. References may
//! legitimately form cycles; this view only reports them.

use std::collections::BTreeMap;

use petgraph::graph::{DiGraph, NodeIndex};

use weft_core::id::ReferenceId;
use weft_core::mode::ModeClassifier;

use crate::indicators::IndicatorRenderer;
use crate::manager::ReferenceGraph;

impl<R: IndicatorRenderer, C: ModeClassifier> ReferenceGraph<R, C> {
    /// Builds a directed graph of files, one edge per reference.
    ///
    /// Nodes are file names, added in name order; edge weights are the
    /// reference IDs.
    pub fn file_graph(&self) -> DiGraph<String, ReferenceId> {
        let references = self.get_all_references();

        let mut names: Vec<&str> = references
            .iter()
            .flat_map(|r| [r.source_mode.default_file(), r.target_file.as_str()])
            .collect();
        names.sort_unstable();
        names.dedup();

        let mut graph = DiGraph::new();
        let index: BTreeMap<&str, NodeIndex> = names
            .into_iter()
            .map(|name| (name, graph.add_node(name.to_string())))
            .collect();

        for r in &references {
            let from = index[r.source_mode.default_file()];
            let to = index[r.target_file.as_str()];
            graph.add_edge(from, to, r.id);
        }
        graph
    }

    /// Groups of two or more files that reach each other through references.
    ///
    /// Each group is sorted by name, and groups are sorted by their first
    /// file.
    pub fn reference_cycles(&self) -> Vec<Vec<String>> {
        use petgraph::algo::kosaraju_scc;

        let graph = self.file_graph();
        let mut cycles: Vec<Vec<String>> = kosaraju_scc(&graph)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| {
                let mut files: Vec<String> = scc.into_iter().map(|idx| graph[idx].clone()).collect();
                files.sort();
                files
            })
            .collect();
        cycles.sort();
        cycles
    }
}
