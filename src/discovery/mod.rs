use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::config::Config;
use crate::error::GraphError;
use crate::parser::canonical_path;

/// Extensions the tokenizer understands.
pub const SOURCE_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx"];

/// A source file found under the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Canonical project-relative path, the file's record key.
    pub relative: String,
    pub path: PathBuf,
}

pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    Some(canonical_path(&relative.to_string_lossy()))
}

/// Walk `root` and collect every source file not excluded by the config's
/// ignore patterns. Ignored directories are not descended into.
///
/// `.gitignore` and hidden-file rules are not applied: `dependor.json` is the
/// only source of exclusions. Results are sorted by relative path. Any walk
/// error aborts discovery.
pub fn discover_files(root: &Path, config: &Config) -> Result<Vec<DiscoveredFile>, GraphError> {
    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b));

    let filter_root = root.to_path_buf();
    let filter_config = config.clone();
    builder.filter_entry(move |entry| {
        if entry.depth() == 0 {
            return true;
        }
        let Some(relative) = relative_key(&filter_root, entry.path()) else {
            return true;
        };
        if filter_config.should_ignore(&relative) {
            if entry.file_type().is_some_and(|ft| ft.is_dir()) {
                log::info!("skipping ignored directory {relative}");
            }
            return false;
        }
        true
    });

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = entry?;
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let path = entry.path();
        if !is_source_file(path) {
            continue;
        }
        let Some(relative) = relative_key(root, path) else {
            continue;
        };
        files.push(DiscoveredFile {
            relative,
            path: path.to_path_buf(),
        });
    }

    files.sort_by(|a, b| a.relative.cmp(&b.relative));
    log::debug!("discovered {} source files under {}", files.len(), root.display());
    Ok(files)
}
