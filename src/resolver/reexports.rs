//! Aggregator ("index" file) resolution tables.
//!
//! For every aggregator, map each name it re-exports to the file that owns
//! it. The base pass only looks one hop deep, at the target files' own
//! `exports`. [`propagate_chains`] optionally extends tables through
//! aggregators that re-export other aggregators.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::model::{ReExport, TokenRecord};

use super::RecordSet;

/// Exposed name -> owning file, for one aggregator.
pub type ReExportTable = IndexMap<String, String>;

static AGGREGATOR_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|/)index\.(js|ts|jsx|tsx)$").unwrap());

/// Whether a canonical path's final component is `index.{js,ts,jsx,tsx}`.
pub fn is_aggregator(path: &str) -> bool {
    AGGREGATOR_NAME.is_match(path)
}

/// Build one aggregator's table from its re-export entries.
///
/// Entries whose specifier names no known record are dropped. A wildcard
/// takes every name the target exports; a named entry takes only its listed
/// names, and only those the target actually exports. Later entries win.
pub fn build_table(record: &TokenRecord, records: &RecordSet) -> ReExportTable {
    let mut table = ReExportTable::new();
    for re_export in &record.re_exports {
        let Some(target) = records.get(re_export.specifier()) else {
            log::debug!(
                "{}: re-export target {} is not a project file",
                record.path,
                re_export.specifier()
            );
            continue;
        };
        match re_export {
            ReExport::Wildcard { .. } => {
                for name in &target.exports {
                    table.insert(name.clone(), target.path.clone());
                }
            }
            ReExport::Named { bindings, .. } => {
                for binding in bindings {
                    if target.exports_name(&binding.name) {
                        table.insert(binding.exposed_name().to_string(), target.path.clone());
                    }
                }
            }
        }
    }
    table
}

/// Extend tables through aggregator-to-aggregator re-exports until nothing
/// changes. Returns the number of propagation rounds that added entries.
///
/// A name is inserted into a table at most once, and never when the
/// aggregator exports it itself, so cyclic chains settle.
pub fn propagate_chains(
    tables: &mut BTreeMap<String, ReExportTable>,
    records: &RecordSet,
) -> usize {
    let mut rounds = 0;
    loop {
        let snapshot = tables.clone();
        let mut changed = false;

        for (path, table) in tables.iter_mut() {
            let Some(record) = records.get(path) else {
                continue;
            };
            for re_export in &record.re_exports {
                if re_export.specifier() == path.as_str() {
                    continue;
                }
                let Some(upstream) = snapshot.get(re_export.specifier()) else {
                    continue;
                };
                let inherited: Vec<(String, String)> = match re_export {
                    ReExport::Wildcard { .. } => upstream
                        .iter()
                        .map(|(name, owner)| (name.clone(), owner.clone()))
                        .collect(),
                    ReExport::Named { bindings, .. } => bindings
                        .iter()
                        .filter_map(|b| {
                            upstream
                                .get(&b.name)
                                .map(|owner| (b.exposed_name().to_string(), owner.clone()))
                        })
                        .collect(),
                };
                for (name, owner) in inherited {
                    if record.exports_name(&name) || table.contains_key(&name) {
                        continue;
                    }
                    table.insert(name, owner);
                    changed = true;
                }
            }
        }

        if !changed {
            return rounds;
        }
        rounds += 1;
    }
}
