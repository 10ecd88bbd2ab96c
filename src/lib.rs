pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod graph_parser;
pub mod model;
pub mod parser;
pub mod resolver;

pub use config::{Config, ConfigWarning};
pub use error::GraphError;
pub use graph_parser::GraphParser;
pub use model::{DependencyGraph, ReExport, ReExportBinding, TokenRecord};
pub use parser::{tokenize, TokenizeError};
pub use resolver::{GraphResolver, ResolveOptions};
