use std::path::Path;

use anyhow::Result;
use clap::Parser;

use dependor::cli::commands;
use dependor::cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();

    let output = match cli.command {
        Commands::Graph {
            ref root,
            follow_reexport_chains,
        } => commands::run_graph(Path::new(root), follow_reexport_chains, cli.format)?,

        Commands::Tokens { ref file, ref root } => {
            commands::run_tokens(Path::new(root), file, cli.format)?
        }

        Commands::Importers { ref file, ref root } => {
            commands::run_importers(Path::new(root), file, cli.format)?
        }
    };
    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }

    Ok(())
}
