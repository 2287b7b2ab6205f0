//! modesync CLI
//!
//! Discovers mode record files, validates them and merges them into the
//! host's custom mode configuration files.

mod cli;
mod commands;
mod error;
mod logging;

use clap::{CommandFactory, Parser};
use colored::Colorize;

use cli::{BackupAction, Cli, Commands};
use error::Result;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Some(cmd) => execute_command(cmd),
        None => {
            // No command provided - show help hint
            println!("{} Sync custom modes into the host configuration", "modesync".green().bold());
            println!();
            println!("Run {} for available commands.", "modesync --help".cyan());
            Ok(0)
        }
    }
}

fn execute_command(cmd: Commands) -> Result<i32> {
    let cwd = std::env::current_dir()?;
    match cmd {
        Commands::Sync(args) => commands::run_sync(&cwd, &args),
        Commands::Backup { action } => {
            match action {
                BackupAction::List { json, paths } => commands::run_backup_list(&cwd, &paths, json)?,
                BackupAction::Restore {
                    target,
                    number,
                    paths,
                } => commands::run_backup_restore(&cwd, &paths, target.into(), number)?,
            }
            Ok(0)
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "modesync", &mut std::io::stdout());
            Ok(0)
        }
    }
}
