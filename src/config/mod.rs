use std::borrow::Cow;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resolver::specifier::clean_path;

/// Name of the config document looked up in the project root.
pub const CONFIG_FILENAME: &str = "dependor.json";

/// On-disk shape of `dependor.json`. Every key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    /// Glob patterns for paths the walker skips.
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    /// Alias prefix -> real path prefix, e.g. `"~": "src"`.
    #[serde(default)]
    pub aliases: IndexMap<String, String>,
    /// Caller-owned section, passed through untouched.
    #[serde(default)]
    pub custom: Option<serde_json::Value>,
}

/// Why the default config was substituted. Never fatal.
#[derive(Debug, Error)]
pub enum ConfigWarning {
    #[error("no dependor.json found in {}, using the default config", .0.display())]
    Missing(PathBuf),
    #[error("failed to read {}: {source}, using the default config", path.display())]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}, using the default config", path.display())]
    Invalid {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid ignore pattern {pattern:?}: {source}, using the default config")]
    InvalidPattern {
        pattern: String,
        source: globset::Error,
    },
}

/// Resolved configuration: ignore predicate, alias table and custom section.
#[derive(Debug, Clone)]
pub struct Config {
    ignore_patterns: Vec<String>,
    ignore: GlobSet,
    /// Sorted by prefix length, longest first.
    aliases: Vec<(String, String)>,
    custom: Option<serde_json::Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ignore_patterns: Vec::new(),
            ignore: GlobSet::empty(),
            aliases: Vec::new(),
            custom: None,
        }
    }
}

impl Config {
    /// Build a config from its document form, compiling ignore patterns.
    pub fn from_file(file: ConfigFile) -> Result<Self, ConfigWarning> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &file.ignore_patterns {
            let glob = Glob::new(pattern).map_err(|source| ConfigWarning::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        let ignore = builder
            .build()
            .map_err(|source| ConfigWarning::InvalidPattern {
                pattern: file.ignore_patterns.join(", "),
                source,
            })?;

        let mut aliases: Vec<(String, String)> = file
            .aliases
            .into_iter()
            .filter(|(prefix, _)| !prefix.is_empty())
            .collect();
        aliases.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        Ok(Self {
            ignore_patterns: file.ignore_patterns,
            ignore,
            aliases,
            custom: file.custom,
        })
    }

    /// Parse `dependor.json` content.
    pub fn parse(json: &str, path: &Path) -> Result<Self, ConfigWarning> {
        let file: ConfigFile =
            serde_json::from_str(json).map_err(|source| ConfigWarning::Invalid {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_file(file)
    }

    /// Load `dependor.json` from `root`.
    pub fn load(root: &Path) -> Result<Self, ConfigWarning> {
        let path = root.join(CONFIG_FILENAME);
        if !path.is_file() {
            return Err(ConfigWarning::Missing(root.to_path_buf()));
        }
        let content =
            std::fs::read_to_string(&path).map_err(|source| ConfigWarning::Unreadable {
                path: path.clone(),
                source,
            })?;
        Self::parse(&content, &path)
    }

    /// Load `dependor.json` from `root`, falling back to the default config.
    pub fn load_or_default(root: &Path) -> (Self, Option<ConfigWarning>) {
        match Self::load(root) {
            Ok(config) => (config, None),
            Err(warning) => {
                log::warn!("{warning}");
                (Self::default(), Some(warning))
            }
        }
    }

    /// Whether a project-relative path, or any single component of it,
    /// matches an ignore pattern.
    pub fn should_ignore(&self, relative: &str) -> bool {
        if self.ignore.is_empty() {
            return false;
        }
        self.ignore.is_match(relative)
            || relative
                .split('/')
                .filter(|c| !c.is_empty())
                .any(|component| self.ignore.is_match(component))
    }

    /// Rewrite a leading alias prefix to its target path prefix.
    ///
    /// The longest matching alias wins and at most one replacement happens.
    /// A prefix only matches on a path-segment boundary.
    pub fn replace_alias<'s>(&self, specifier: &'s str) -> Cow<'s, str> {
        for (prefix, target) in &self.aliases {
            let Some(rest) = specifier.strip_prefix(prefix.as_str()) else {
                continue;
            };
            if !(rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/')) {
                continue;
            }
            let joined = match (target.ends_with('/'), rest.starts_with('/')) {
                (true, true) => format!("{}{}", target, &rest[1..]),
                (false, false) if !rest.is_empty() && !target.is_empty() => {
                    format!("{target}/{rest}")
                }
                _ => format!("{target}{rest}"),
            };
            return Cow::Owned(clean_path(&joined));
        }
        Cow::Borrowed(specifier)
    }

    pub fn ignore_patterns(&self) -> &[String] {
        &self.ignore_patterns
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(a, b)| (a.as_str(), b.as_str()))
    }

    /// The `custom` section exactly as written.
    pub fn custom(&self) -> Option<&serde_json::Value> {
        self.custom.as_ref()
    }

    /// The `custom` section deserialized into a caller type.
    pub fn custom_as<T: DeserializeOwned>(&self) -> Result<Option<T>, serde_json::Error> {
        self.custom
            .clone()
            .map(serde_json::from_value)
            .transpose()
    }
}
