use std::collections::{BTreeMap, HashSet};

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// File-level dependency graph: canonical file path -> resolved dependencies.
///
/// Every tokenized file is a node. Targets without a node of their own are
/// external or unresolvable specifiers, kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyGraph {
    edges: BTreeMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node with its dependency list, dropping repeated targets
    /// while keeping first-seen order.
    pub fn insert(&mut self, path: impl Into<String>, dependencies: Vec<String>) {
        let deduped: IndexSet<String> = dependencies.into_iter().collect();
        self.edges.insert(path.into(), deduped.into_iter().collect());
    }

    /// Direct dependencies of a file, or `None` when it is not a node.
    pub fn dependencies(&self, path: &str) -> Option<&[String]> {
        self.edges.get(path).map(Vec::as_slice)
    }

    /// Files that list `target` among their dependencies, sorted.
    pub fn importers_of(&self, target: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|(_, deps)| deps.iter().any(|d| d == target))
            .map(|(path, _)| path.as_str())
            .collect()
    }

    /// Whether `path` is a project file (has its own node).
    pub fn is_internal(&self, path: &str) -> bool {
        self.edges.contains_key(path)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.edges.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Node-by-node comparison that ignores edge order.
    pub fn equivalent(&self, other: &DependencyGraph) -> bool {
        if self.edges.len() != other.edges.len() {
            return false;
        }
        self.edges.iter().all(|(path, deps)| {
            other.edges.get(path).is_some_and(|theirs| {
                let ours: HashSet<&String> = deps.iter().collect();
                let theirs: HashSet<&String> = theirs.iter().collect();
                ours == theirs
            })
        })
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<String>> {
        self.edges
    }
}
