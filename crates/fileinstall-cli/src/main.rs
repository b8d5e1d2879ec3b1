//! fileinstall CLI
//!
//! Command-line host for the fileinstall directory reconciler.

mod cli;
mod commands;
mod context;
mod error;
mod logging;
mod pipeline;

use std::time::Duration;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use context::{Overrides, Sources};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    tracing::debug!("Verbose mode enabled");

    let sources = Sources {
        config_file: cli.config.as_deref(),
        properties: &cli.properties,
    };

    match cli.command {
        Some(cmd) => execute_command(cmd, &sources, cli.verbose),
        None => {
            // No command provided - show help hint
            println!("{} directory reconciler", "fileinstall".green().bold());
            println!();
            println!("Run {} for available commands.", "fileinstall --help".cyan());
            Ok(())
        }
    }
}

fn execute_command(cmd: Commands, sources: &Sources<'_>, verbose: bool) -> Result<()> {
    match cmd {
        Commands::Run {
            directories,
            interval,
            autocreate,
            json,
            exit_after,
        } => {
            let properties = context::build(
                sources,
                &Overrides {
                    directories: Some(&directories),
                    interval,
                    autocreate,
                },
            )?;
            commands::run_monitor(&properties, json, exit_after.map(Duration::from_millis))
        }
        Commands::Scan { directories, json } => {
            let properties = context::build(
                sources,
                &Overrides {
                    directories: Some(&directories),
                    ..Overrides::default()
                },
            )?;
            commands::run_scan(&properties, json)
        }
        Commands::Scheme { dir, home } => commands::run_scheme(&dir, home.as_deref(), verbose),
    }
}
