mod cli;
mod commands;
mod config;
mod executor;
mod manifest;
mod paths;
mod ui;
mod workspace;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Commands};
use std::io;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Destroy { repository, yes } => commands::workspace::destroy(&ctx, &repository, yes),
        Commands::Bounce { repository } => commands::workspace::bounce(&ctx, &repository),
        Commands::Diff { repository } => commands::workspace::diff(&ctx, &repository),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "capstan", &mut io::stdout());
            Ok(())
        }
    }
}
