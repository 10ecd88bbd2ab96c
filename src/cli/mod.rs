use clap::{ArgAction, Parser, Subcommand, ValueEnum};

pub mod commands;
pub mod output;

#[derive(Parser)]
#[command(
    name = "dependor",
    version,
    about = "File-level dependency graphs for JavaScript and TypeScript projects"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the dependency graph of a project
    Graph {
        /// Project root (default: current directory)
        #[arg(default_value = ".")]
        root: String,
        /// Resolve names through aggregators that re-export other aggregators
        #[arg(long)]
        follow_reexport_chains: bool,
    },

    /// Show what the tokenizer extracts from a single file
    Tokens {
        /// File path, relative to the root
        file: String,
        /// Project root the file path is relative to
        #[arg(long, default_value = ".")]
        root: String,
    },

    /// List the files that depend on a file
    Importers {
        /// File path, relative to the root
        file: String,
        /// Project root (default: current directory)
        #[arg(default_value = ".")]
        root: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Compact,
}

impl Cli {
    /// `env_logger` filter for the requested verbosity.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
