use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

pub mod graph;

pub use graph::DependencyGraph;

/// Reserved identifier for a default import or export.
pub const DEFAULT_IDENT: &str = "default";

/// Reserved identifier recorded for a namespace binding (`import * as ns`).
pub const NAMESPACE_IDENT: &str = "*";

/// Ordered, duplicate-free set of identifier names.
pub type IdentSet = IndexSet<String>;

/// A single name listed in `export { ... } from "x"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReExportBinding {
    /// Name as exported by the target module.
    pub name: String,
    /// Name the re-exporting module exposes it under, when renamed.
    pub alias: Option<String>,
}

impl ReExportBinding {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }

    /// The name importers of the re-exporting module use.
    pub fn exposed_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// A re-export declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReExport {
    /// `export * from "specifier"`
    Wildcard { specifier: String },
    /// `export { a, b as c } from "specifier"`
    Named {
        specifier: String,
        bindings: Vec<ReExportBinding>,
    },
}

impl ReExport {
    pub fn specifier(&self) -> &str {
        match self {
            ReExport::Wildcard { specifier } | ReExport::Named { specifier, .. } => specifier,
        }
    }

    pub(crate) fn set_specifier(&mut self, value: String) {
        match self {
            ReExport::Wildcard { specifier } | ReExport::Named { specifier, .. } => {
                *specifier = value
            }
        }
    }
}

/// Everything the tokenizer extracts from one source file.
///
/// `imports` keys are raw (relative specifiers already joined with the file's
/// directory) until normalization, canonical afterwards. `re_export_map` stays
/// empty until aggregator linking fills it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub path: String,
    pub imports: IndexMap<String, IdentSet>,
    pub exports: IdentSet,
    pub re_exports: Vec<ReExport>,
    pub re_export_map: IndexMap<String, String>,
}

impl TokenRecord {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Record an import of `idents` from `specifier`, merging with earlier
    /// statements for the same specifier.
    pub fn add_import<I, S>(&mut self, specifier: impl Into<String>, idents: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.imports.entry(specifier.into()).or_default();
        entry.extend(idents.into_iter().map(Into::into));
    }

    pub fn add_export(&mut self, name: impl Into<String>) {
        self.exports.insert(name.into());
    }

    /// Specifiers in first-seen order, as they currently stand.
    pub fn import_specifiers(&self) -> impl Iterator<Item = &str> {
        self.imports.keys().map(String::as_str)
    }

    pub fn exports_name(&self, name: &str) -> bool {
        self.exports.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty() && self.exports.is_empty() && self.re_exports.is_empty()
    }
}
