use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde::de::DeserializeOwned;

use crate::config::{Config, ConfigWarning};
use crate::discovery::discover_files;
use crate::error::GraphError;
use crate::model::{DependencyGraph, TokenRecord};
use crate::parser::{tokenize_file, TokenizeError};
use crate::resolver::{record_set, GraphResolver, ResolveOptions};

/// Callback run once per discovered file, before it is tokenized.
pub type Middleware = Box<dyn FnMut(&str) + Send>;

/// Builds a [`DependencyGraph`] for every source file under a project root.
///
/// ```no_run
/// use dependor::GraphParser;
///
/// let mut parser = GraphParser::new("./my-app")?;
/// parser.add_middleware(|path| println!("scanning {path}"));
/// let graph = parser.parse_graph()?;
/// # Ok::<(), dependor::GraphError>(())
/// ```
pub struct GraphParser {
    root: PathBuf,
    config: Config,
    config_warning: Option<ConfigWarning>,
    middleware: Vec<Middleware>,
    failures: Vec<TokenizeError>,
}

impl GraphParser {
    /// Open a project root and load its `dependor.json`, falling back to the
    /// default config when it is missing or invalid.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, GraphError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(GraphError::RootNotFound(root.to_path_buf()));
        }
        let (config, config_warning) = Config::load_or_default(root);
        Ok(Self::with_config(root, config, config_warning))
    }

    /// Use an already-built config instead of reading `dependor.json`.
    pub fn with_config(
        root: impl Into<PathBuf>,
        config: Config,
        config_warning: Option<ConfigWarning>,
    ) -> Self {
        Self {
            root: root.into(),
            config,
            config_warning,
            middleware: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Register a callback. Callbacks run in registration order, once per
    /// discovered file, with the file's project-relative path.
    pub fn add_middleware<F>(&mut self, middleware: F) -> &mut Self
    where
        F: FnMut(&str) + Send + 'static,
    {
        self.middleware.push(Box::new(middleware));
        self
    }

    pub fn parse_graph(&mut self) -> Result<DependencyGraph, GraphError> {
        self.parse_graph_with(ResolveOptions::default())
    }

    /// Discover, tokenize and resolve the whole project.
    ///
    /// Files that fail to tokenize are logged, left out of the graph and kept
    /// in [`GraphParser::tokenize_failures`]; specifiers naming them stay
    /// external.
    pub fn parse_graph_with(
        &mut self,
        options: ResolveOptions,
    ) -> Result<DependencyGraph, GraphError> {
        let start = Instant::now();
        if !self.root.is_dir() {
            return Err(GraphError::RootNotFound(self.root.clone()));
        }

        let discovered = discover_files(&self.root, &self.config)?;
        for file in &discovered {
            for middleware in &mut self.middleware {
                middleware(&file.relative);
            }
        }

        let root = self.root.as_path();
        let results: Vec<Result<TokenRecord, TokenizeError>> = discovered
            .par_iter()
            .map(|file| tokenize_file(root, &file.relative))
            .collect();

        let mut records = Vec::with_capacity(results.len());
        self.failures.clear();
        for result in results {
            match result {
                Ok(record) => records.push(record),
                Err(err) => {
                    log::warn!("skipping file: {err}");
                    self.failures.push(err);
                }
            }
        }

        if records.is_empty() && !discovered.is_empty() {
            return Err(GraphError::Construction(format!(
                "none of the {} discovered files could be tokenized",
                discovered.len()
            )));
        }

        let graph =
            GraphResolver::with_options(&self.config, options).resolve(record_set(records));
        log::info!(
            "built graph for {} in {:.2?}",
            self.root.display(),
            start.elapsed()
        );
        Ok(graph)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Why the default config is in use, if it is.
    pub fn config_warning(&self) -> Option<&ConfigWarning> {
        self.config_warning.as_ref()
    }

    /// The `custom` section of `dependor.json`, verbatim.
    pub fn custom_config(&self) -> Option<&serde_json::Value> {
        self.config.custom()
    }

    pub fn custom_config_as<T: DeserializeOwned>(&self) -> Result<Option<T>, serde_json::Error> {
        self.config.custom_as()
    }

    /// Files the last run could not tokenize.
    pub fn tokenize_failures(&self) -> &[TokenizeError] {
        &self.failures
    }
}
