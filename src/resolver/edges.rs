use indexmap::IndexSet;

use crate::model::{IdentSet, TokenRecord, NAMESPACE_IDENT};

use super::reexports::is_aggregator;
use super::RecordSet;

/// Dependency edges for one file, in first-seen order without repeats.
///
/// A specifier naming a known aggregator is resolved per identifier;
/// anything else contributes itself as a single edge.
pub fn edges_for(record: &TokenRecord, records: &RecordSet) -> Vec<String> {
    let mut edges: IndexSet<String> = IndexSet::new();
    for (specifier, idents) in &record.imports {
        match records.get(specifier) {
            Some(target) if is_aggregator(&target.path) => {
                edges.extend(resolve_through_aggregator(target, idents, &record.path));
            }
            _ => {
                edges.insert(specifier.clone());
            }
        }
    }
    edges.into_iter().collect()
}

/// Resolve identifiers imported from an aggregator to the files that own them.
///
/// Own exports and namespace imports stay on the aggregator; re-exported
/// names follow its table; unknown names produce no edge. A bare import
/// (side-effect, `require`, dynamic) has no identifiers and so no edge.
fn resolve_through_aggregator(
    aggregator: &TokenRecord,
    idents: &IdentSet,
    importer: &str,
) -> IndexSet<String> {
    let mut resolved = IndexSet::new();
    for ident in idents {
        if ident == NAMESPACE_IDENT || aggregator.exports_name(ident) {
            resolved.insert(aggregator.path.clone());
        } else if let Some(owner) = aggregator.re_export_map.get(ident) {
            resolved.insert(owner.clone());
        } else {
            log::debug!(
                "{importer}: {ident:?} is not exported by {}",
                aggregator.path
            );
        }
    }
    resolved
}
