use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::TokenRecord;
use crate::resolver::specifier::clean_path;

mod scanner;
pub mod typescript;

/// File-scoped tokenizer failures. Neither aborts a whole run.
#[derive(Debug, Error)]
pub enum TokenizeError {
    /// An `import` statement that never reaches a valid end.
    #[error("{path}:{line}:{column}: malformed import statement, expected {expected}")]
    MalformedImport {
        path: String,
        line: usize,
        column: usize,
        expected: &'static str,
    },
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Extract imports, exports and re-exports from one file's text.
///
/// `path` is the file's project-relative path; relative specifiers are joined
/// with its directory. The returned record's `path` is the cleaned form.
pub fn tokenize(source: &str, path: &str) -> Result<TokenRecord, TokenizeError> {
    typescript::Extractor::new(source, canonical_path(path)).run()
}

/// Read `root/relative` and tokenize it under the key `relative`.
pub fn tokenize_file(root: &Path, relative: &str) -> Result<TokenRecord, TokenizeError> {
    let full = root.join(relative);
    let source = std::fs::read_to_string(&full).map_err(|source| TokenizeError::Read {
        path: full.clone(),
        source,
    })?;
    tokenize(&source, relative)
}

/// Project-relative key for a path: forward slashes, no `./` or `..` detours.
pub fn canonical_path(path: &str) -> String {
    clean_path(&path.replace('\\', "/"))
}
