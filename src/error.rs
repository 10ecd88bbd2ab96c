use std::path::PathBuf;

use thiserror::Error;

/// Run-scoped failures. Any of these aborts a whole `parse_graph` call.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("project root {} does not exist or is not a directory", .0.display())]
    RootNotFound(PathBuf),

    #[error("failed to walk the project tree: {0}")]
    Traversal(#[from] ignore::Error),

    #[error("failed to construct the dependency graph: {0}")]
    Construction(String),
}
