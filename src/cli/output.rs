use serde::Serialize;

use super::OutputFormat;
use crate::model::{DependencyGraph, ReExport, TokenRecord};

fn to_json<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> String {
    match format {
        OutputFormat::Compact => serde_json::to_string(value).unwrap_or_default(),
        _ => serde_json::to_string_pretty(value).unwrap_or_default(),
    }
}

/// Format a whole graph: one block per file, dependencies indented below.
pub fn format_graph(graph: &DependencyGraph, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json | OutputFormat::Compact => to_json(graph, format),
        OutputFormat::Text => {
            let mut output = String::new();
            for (path, dependencies) in graph.nodes() {
                output.push_str(path);
                output.push('\n');
                for dep in dependencies {
                    let marker = if graph.is_internal(dep) { "->" } else { "~>" };
                    output.push_str(&format!("  {marker} {dep}\n"));
                }
            }
            output.push_str(&format!(
                "\n{} files, {} edges\n",
                graph.len(),
                graph.edge_count()
            ));
            output
        }
    }
}

/// Format one file's token record.
pub fn format_tokens(record: &TokenRecord, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json | OutputFormat::Compact => to_json(record, format),
        OutputFormat::Text => {
            let mut output = format!("{}\n", record.path);
            output.push_str("imports:\n");
            for (specifier, idents) in &record.imports {
                let names: Vec<&str> = idents.iter().map(String::as_str).collect();
                output.push_str(&format!("  {specifier} [{}]\n", names.join(", ")));
            }
            output.push_str("exports:\n");
            for name in &record.exports {
                output.push_str(&format!("  {name}\n"));
            }
            if !record.re_exports.is_empty() {
                output.push_str("re-exports:\n");
                for re_export in &record.re_exports {
                    match re_export {
                        ReExport::Wildcard { specifier } => {
                            output.push_str(&format!("  * from {specifier}\n"));
                        }
                        ReExport::Named {
                            specifier,
                            bindings,
                        } => {
                            let names: Vec<String> = bindings
                                .iter()
                                .map(|b| match &b.alias {
                                    Some(alias) => format!("{} as {alias}", b.name),
                                    None => b.name.clone(),
                                })
                                .collect();
                            output.push_str(&format!(
                                "  {{ {} }} from {specifier}\n",
                                names.join(", ")
                            ));
                        }
                    }
                }
            }
            output
        }
    }
}

/// Format the importers of `target`.
pub fn format_importers(target: &str, importers: &[&str], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json | OutputFormat::Compact => {
            let value = serde_json::json!({
                "file": target,
                "importers": importers,
            });
            to_json(&value, format)
        }
        OutputFormat::Text => {
            if importers.is_empty() {
                return format!("No files import {target}\n");
            }
            let mut output = format!("{} files import {target}:\n", importers.len());
            for importer in importers {
                output.push_str(&format!("  {importer}\n"));
            }
            output
        }
    }
}
