use std::path::Path;

use anyhow::{Context, Result};

use crate::graph_parser::GraphParser;
use crate::parser::{canonical_path, tokenize_file};
use crate::resolver::ResolveOptions;

use super::output::{format_graph, format_importers, format_tokens};
use super::OutputFormat;

fn open_project(root: &Path) -> Result<GraphParser> {
    GraphParser::new(root).with_context(|| format!("failed to open project {}", root.display()))
}

/// Build and print the dependency graph of a project.
pub fn run_graph(root: &Path, follow_reexport_chains: bool, format: OutputFormat) -> Result<String> {
    let mut parser = open_project(root)?;
    let options = ResolveOptions {
        follow_reexport_chains,
    };
    let graph = parser
        .parse_graph_with(options)
        .context("failed to build dependency graph")?;
    Ok(format_graph(&graph, format))
}

/// Tokenize a single file without resolving anything.
pub fn run_tokens(root: &Path, file: &str, format: OutputFormat) -> Result<String> {
    let relative = canonical_path(file);
    let record = tokenize_file(root, &relative)
        .with_context(|| format!("failed to tokenize {relative}"))?;
    Ok(format_tokens(&record, format))
}

/// List files whose resolved dependencies include `file`.
pub fn run_importers(root: &Path, file: &str, format: OutputFormat) -> Result<String> {
    let target = canonical_path(file);
    let mut parser = open_project(root)?;
    let graph = parser
        .parse_graph()
        .context("failed to build dependency graph")?;
    if !graph.is_internal(&target) {
        log::warn!("{target} is not a tokenized project file");
    }
    let importers = graph.importers_of(&target);
    Ok(format_importers(&target, &importers, format))
}
