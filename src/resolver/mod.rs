//! Turns tokenized files into a dependency graph in three passes:
//!
//! 1. [`GraphResolver::normalize`] rewrites every specifier to a record key
//!    where one exists (aliases, extension and `index` probing).
//! 2. [`GraphResolver::link`] builds each aggregator's re-export table.
//! 3. [`GraphResolver::assemble`] emits per-file edges, resolving imports
//!    through aggregators to the files that own the imported names.
//!
//! Each pass takes its input by value and returns the next stage, so a record
//! set cannot be linked before it is normalized.

use std::collections::{BTreeMap, HashSet};

use rayon::prelude::*;

use crate::config::Config;
use crate::model::{DependencyGraph, TokenRecord};

pub mod edges;
pub mod reexports;
pub mod specifier;

use reexports::{build_table, is_aggregator, propagate_chains, ReExportTable};
use specifier::SpecifierNormalizer;

/// Token records keyed by canonical project-relative path.
pub type RecordSet = BTreeMap<String, TokenRecord>;

/// Knobs for the resolution passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Follow re-exports through aggregators that re-export other
    /// aggregators, so edges land on the file that declares a name.
    pub follow_reexport_chains: bool,
}

/// Records whose specifiers have been normalized.
#[derive(Debug, Clone)]
pub struct NormalizedRecords(RecordSet);

/// Normalized records whose aggregators carry re-export tables.
#[derive(Debug, Clone)]
pub struct LinkedRecords(RecordSet);

macro_rules! stage_accessors {
    ($stage:ident) => {
        impl $stage {
            pub fn get(&self, path: &str) -> Option<&TokenRecord> {
                self.0.get(path)
            }

            pub fn records(&self) -> &RecordSet {
                &self.0
            }

            pub fn len(&self) -> usize {
                self.0.len()
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            pub fn into_records(self) -> RecordSet {
                self.0
            }
        }
    };
}

stage_accessors!(NormalizedRecords);
stage_accessors!(LinkedRecords);

/// Collect records into a [`RecordSet`]. On a duplicate path the later
/// record replaces the earlier one.
pub fn record_set(records: impl IntoIterator<Item = TokenRecord>) -> RecordSet {
    let mut set = RecordSet::new();
    for record in records {
        if let Some(previous) = set.insert(record.path.clone(), record) {
            log::warn!("duplicate record for {}, keeping the last one", previous.path);
        }
    }
    set
}

pub struct GraphResolver<'a> {
    config: &'a Config,
    options: ResolveOptions,
}

impl<'a> GraphResolver<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self::with_options(config, ResolveOptions::default())
    }

    pub fn with_options(config: &'a Config, options: ResolveOptions) -> Self {
        Self { config, options }
    }

    /// Pass 1: rewrite import and re-export specifiers to record keys.
    pub fn normalize(&self, mut records: RecordSet) -> NormalizedRecords {
        let known: HashSet<String> = records.keys().cloned().collect();
        let normalizer = SpecifierNormalizer::new(&known, self.config);
        records
            .par_iter_mut()
            .for_each(|(_, record)| normalizer.normalize_record(record));
        NormalizedRecords(records)
    }

    /// Pass 2: fill `re_export_map` on every aggregator.
    pub fn link(&self, normalized: NormalizedRecords) -> LinkedRecords {
        let mut records = normalized.0;

        let mut tables: BTreeMap<String, ReExportTable> = records
            .par_iter()
            .filter(|(path, _)| is_aggregator(path))
            .map(|(path, record)| (path.clone(), build_table(record, &records)))
            .collect();

        if self.options.follow_reexport_chains {
            let rounds = propagate_chains(&mut tables, &records);
            log::debug!("re-export chains settled after {rounds} round(s)");
        }

        for (path, table) in tables {
            if let Some(record) = records.get_mut(&path) {
                record.re_export_map = table;
            }
        }
        LinkedRecords(records)
    }

    /// Pass 3: one graph node per record.
    pub fn assemble(&self, linked: &LinkedRecords) -> DependencyGraph {
        let records = &linked.0;
        let nodes: Vec<(String, Vec<String>)> = records
            .par_iter()
            .map(|(path, record)| (path.clone(), edges::edges_for(record, records)))
            .collect();

        let mut graph = DependencyGraph::new();
        for (path, dependencies) in nodes {
            graph.insert(path, dependencies);
        }
        graph
    }

    /// Run all three passes.
    pub fn resolve(&self, records: RecordSet) -> DependencyGraph {
        let linked = self.link(self.normalize(records));
        let graph = self.assemble(&linked);
        log::info!(
            "resolved {} files with {} edges",
            graph.len(),
            graph.edge_count()
        );
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFile;
    use crate::parser::tokenize;

    fn records(files: &[(&str, &str)]) -> RecordSet {
        record_set(files.iter().map(|(path, src)| tokenize(src, path).unwrap()))
    }

    fn deps<'g>(graph: &'g DependencyGraph, path: &str) -> Vec<&'g str> {
        graph
            .dependencies(path)
            .unwrap()
            .iter()
            .map(String::as_str)
            .collect()
    }

    fn barrel_project() -> RecordSet {
        records(&[
            (
                "main.js",
                r#"import { x, y } from "./lib";
import { func } from "./lib/index";
import { nothing } from "./lib";
import React from "react";"#,
            ),
            (
                "lib/index.js",
                r#"export * from "./a";
export { func } from "./test";"#,
            ),
            ("lib/a.js", "export const x = 1;\nexport const y = 2;"),
            ("lib/test.js", "export function func() {}\nexport const other = 1;"),
        ])
    }

    #[test]
    fn test_normalize_probes_and_merges() {
        let config = Config::default();
        let resolver = GraphResolver::new(&config);
        let normalized = resolver.normalize(barrel_project());

        let main = normalized.get("main.js").unwrap();
        assert_eq!(
            main.import_specifiers().collect::<Vec<_>>(),
            vec!["lib/index.js", "react"]
        );
        let idents: Vec<_> = main.imports["lib/index.js"].iter().cloned().collect();
        assert_eq!(idents, vec!["x", "y", "func", "nothing"]);

        let index = normalized.get("lib/index.js").unwrap();
        let targets: Vec<_> = index.re_exports.iter().map(|r| r.specifier()).collect();
        assert_eq!(targets, vec!["lib/a.js", "lib/test.js"]);
    }

    #[test]
    fn test_link_fills_only_aggregators() {
        let config = Config::default();
        let resolver = GraphResolver::new(&config);
        let linked = resolver.link(resolver.normalize(barrel_project()));

        let table = &linked.get("lib/index.js").unwrap().re_export_map;
        assert_eq!(table.get("x").map(String::as_str), Some("lib/a.js"));
        assert_eq!(table.get("func").map(String::as_str), Some("lib/test.js"));
        assert!(!table.contains_key("other"));
        assert!(linked.get("main.js").unwrap().re_export_map.is_empty());
    }

    #[test]
    fn test_resolve_through_aggregator() {
        let config = Config::default();
        let graph = GraphResolver::new(&config).resolve(barrel_project());

        assert_eq!(graph.len(), 4);
        assert_eq!(deps(&graph, "main.js"), vec!["lib/a.js", "lib/test.js", "react"]);
        assert!(deps(&graph, "lib/a.js").is_empty());
        assert_eq!(deps(&graph, "lib/index.js"), vec!["lib/test.js"]);
    }

    #[test]
    fn test_resolve_with_aliases() {
        let config = Config::from_file(ConfigFile {
            aliases: [("~".to_string(), "src".to_string())].into_iter().collect(),
            ..Default::default()
        })
        .unwrap();
        let records = records(&[
            ("src/app.ts", r#"import { path } from "~/path";"#),
            ("src/path.ts", "export const path = 1;"),
        ]);
        let graph = GraphResolver::new(&config).resolve(records);
        assert_eq!(deps(&graph, "src/app.ts"), vec!["src/path.ts"]);
    }

    #[test]
    fn test_follow_reexport_chains() {
        let files = [
            ("main.ts", r#"import { deep } from "./pkg";"#),
            ("pkg/index.ts", r#"export * from "./inner";"#),
            ("pkg/inner/index.ts", r#"export * from "./deep";"#),
            ("pkg/inner/deep.ts", "export const deep = true;"),
        ];
        let config = Config::default();

        let shallow = GraphResolver::new(&config).resolve(records(&files));
        assert!(deps(&shallow, "main.ts").is_empty());

        let options = ResolveOptions {
            follow_reexport_chains: true,
        };
        let chained = GraphResolver::with_options(&config, options)
            .resolve(records(&files));
        assert_eq!(deps(&chained, "main.ts"), vec!["pkg/inner/deep.ts"]);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let config = Config::default();
        let resolver = GraphResolver::new(&config);
        let first = resolver.resolve(barrel_project());
        let second = resolver.resolve(barrel_project());
        assert_eq!(first, second);

        let renormalized = resolver.normalize(resolver.normalize(barrel_project()).into_records());
        let again = resolver.assemble(&resolver.link(renormalized));
        assert!(again.equivalent(&first));
    }

    #[test]
    fn test_bare_imports_of_an_aggregator_add_no_edge() {
        let config = Config::default();
        let graph = GraphResolver::new(&config).resolve(records(&[
            ("lib/index.js", "export * from './a';"),
            ("lib/a.js", "export const a = 1;"),
            ("side.js", "import './lib';"),
            ("req.js", "require('./lib');"),
            ("lazy.js", "import('./lib/index');"),
        ]));
        assert!(deps(&graph, "side.js").is_empty());
        assert!(deps(&graph, "req.js").is_empty());
        assert!(deps(&graph, "lazy.js").is_empty());
    }

    #[test]
    fn test_named_reexport_of_unknown_specifier() {
        let config = Config::default();
        let resolver = GraphResolver::new(&config);
        let files = [
            ("lib/index.js", "export { a } from 'pkg';
export { b } from './b';"),
            ("lib/b.js", "export const b = 1;"),
            ("main.js", "import { a, b } from './lib';"),
        ];

        let linked = resolver.link(resolver.normalize(records(&files)));
        let table = &linked.get("lib/index.js").unwrap().re_export_map;
        assert!(!table.contains_key("a"));
        assert_eq!(table.get("b").map(String::as_str), Some("lib/b.js"));

        let graph = resolver.assemble(&linked);
        assert_eq!(deps(&graph, "lib/index.js"), vec!["pkg", "lib/b.js"]);
        assert_eq!(deps(&graph, "main.js"), vec!["lib/b.js"]);
    }

    #[test]
    fn test_record_set_keeps_last_duplicate() {
        let mut first = TokenRecord::new("a.js");
        first.add_export("one");
        let mut second = TokenRecord::new("a.js");
        second.add_export("two");
        let set = record_set([first, second]);
        assert_eq!(set.len(), 1);
        assert!(set["a.js"].exports_name("two"));
    }
}
