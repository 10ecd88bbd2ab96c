//! Specifier normalization: path cleaning, relative joining, alias
//! replacement and extension probing against the known record set.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::config::Config;
use crate::model::{IdentSet, TokenRecord};

/// Suffixes probed, in priority order, when a specifier names no file directly.
pub const PROBE_SUFFIXES: &[&str] = &[
    ".js",
    ".ts",
    ".jsx",
    ".tsx",
    "/index.js",
    "/index.ts",
    "/index.jsx",
    "/index.tsx",
];

/// Lexically clean a `/`-separated path: drop `.` and empty segments and
/// fold `..` into its parent where one exists. Never touches the filesystem.
pub fn clean_path(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Directory part of a project-relative path (`""` for top-level files).
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Whether a specifier is relative to the importing file.
pub fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// Join a relative specifier onto `dir`; other specifiers pass through verbatim.
pub fn join_relative(dir: &str, specifier: &str) -> String {
    if !is_relative(specifier) {
        return specifier.to_string();
    }
    if dir.is_empty() {
        clean_path(specifier)
    } else {
        clean_path(&format!("{dir}/{specifier}"))
    }
}

/// Rewrites specifiers to canonical record keys.
pub struct SpecifierNormalizer<'a> {
    known: &'a HashSet<String>,
    config: &'a Config,
}

impl<'a> SpecifierNormalizer<'a> {
    pub fn new(known: &'a HashSet<String>, config: &'a Config) -> Self {
        Self { known, config }
    }

    /// Apply alias replacement, then take the first probe suffix that names
    /// a known record. Unmatched specifiers come back alias-rewritten only.
    pub fn normalize(&self, specifier: &str) -> String {
        let aliased = self.config.replace_alias(specifier);
        for suffix in PROBE_SUFFIXES {
            let candidate = format!("{aliased}{suffix}");
            if self.known.contains(&candidate) {
                return candidate;
            }
        }
        aliased.into_owned()
    }

    /// Rewrite every specifier in a record: `imports` keys (merging keys that
    /// collapse together) and `re_exports` targets.
    pub fn normalize_record(&self, record: &mut TokenRecord) {
        let raw = std::mem::take(&mut record.imports);
        let mut normalized: IndexMap<String, IdentSet> = IndexMap::with_capacity(raw.len());
        for (specifier, idents) in raw {
            normalized
                .entry(self.normalize(&specifier))
                .or_default()
                .extend(idents);
        }
        record.imports = normalized;

        for re_export in &mut record.re_exports {
            let target = self.normalize(re_export.specifier());
            re_export.set_specifier(target);
        }
    }
}
