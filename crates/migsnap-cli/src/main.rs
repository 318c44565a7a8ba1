//! migsnap CLI
//!
//! Command-line interface for migration-state snapshots

use clap::{Parser, Subcommand};
use migsnap_core::logging_facility::{init, Profile};

mod commands;
mod executor;

#[derive(Debug, Parser)]
#[command(name = "migsnap")]
#[command(about = "migsnap - Named snapshots of applied schema migrations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Snapshot operations
    Snapshot(commands::snapshot::SnapshotArgs),
}

fn main() {
    init(Profile::Production);
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Snapshot(args) => commands::snapshot::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
