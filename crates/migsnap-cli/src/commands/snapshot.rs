//! Snapshot commands

use crate::executor::ProcessExecutor;
use clap::{Args, Subcommand};
use migsnap_core::executor::{MigrationExecutor, RejectingExecutor};
use migsnap_core::settings::Settings;
use migsnap_engine::commands::engine_command::{
    apply_engine_command, EngineCommand, EngineCommandResult,
};
use migsnap_engine::{CheckoutOutcome, CheckoutReport};
use std::io::BufRead;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(subcommand)]
    pub command: SnapshotCommand,
}

#[derive(Debug, Args)]
pub struct StoreArgs {
    #[arg(long, global = true, default_value = ".migsnap/store.db")]
    pub db: String,

    /// Settings file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Program that applies schema transitions; overrides the settings
    #[arg(long, global = true)]
    pub executor: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum SnapshotCommand {
    /// Capture the current migration state
    Create(CreateArgs),
    /// Migrate to a named snapshot
    Checkout(CheckoutArgs),
    /// Migrate to the most recently created snapshot
    CheckoutLatest(ForceArgs),
    /// Delete a snapshot that is not applied
    Delete(DeleteArgs),
    /// Delete every snapshot
    DeleteHistory(ConfirmArgs),
    /// List snapshots
    List,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Snapshot name; generated when omitted
    pub name: Option<String>,

    #[arg(long)]
    pub overwrite: bool,

    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct CheckoutArgs {
    pub name: String,

    #[command(flatten)]
    pub force: ForceArgs,
}

#[derive(Debug, Args)]
pub struct ForceArgs {
    /// Check out even when the ledger drifted from the applied snapshot
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    pub name: String,

    #[command(flatten)]
    pub confirm: ConfirmArgs,
}

#[derive(Debug, Args)]
pub struct ConfirmArgs {
    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

pub fn execute(args: SnapshotArgs) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load(args.store.config.as_deref())?;

    if let Some(parent) = Path::new(&args.store.db).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut conn = migsnap_store::db::open_store(&args.store.db, &settings.bookkeeping_unit)?;

    let program = args
        .store
        .executor
        .clone()
        .or_else(|| settings.executor_program.clone());
    let process_executor = program.map(|p| ProcessExecutor::new(p, args.store.db.clone()));
    let executor: &dyn MigrationExecutor = match &process_executor {
        Some(e) => e,
        None => &RejectingExecutor,
    };

    let cmd = match args.command {
        SnapshotCommand::Create(a) => EngineCommand::CreateSnapshot {
            name: a.name,
            overwrite: a.overwrite,
            dry_run: a.dry_run,
        },
        SnapshotCommand::Checkout(a) => EngineCommand::Checkout {
            name: a.name,
            force: a.force.force,
        },
        SnapshotCommand::CheckoutLatest(a) => EngineCommand::CheckoutLatest { force: a.force },
        SnapshotCommand::Delete(a) => {
            let confirmed = a.confirm.yes
                || confirm(&format!("Delete snapshot \"{}\"?", a.name))?;
            EngineCommand::DeleteByName {
                name: a.name,
                confirmed,
            }
        }
        SnapshotCommand::DeleteHistory(a) => {
            let confirmed = a.yes || confirm("Delete the entire snapshot history?")?;
            EngineCommand::DeleteHistory { confirmed }
        }
        SnapshotCommand::List => EngineCommand::ListSnapshots,
    };

    let dry_run = matches!(cmd, EngineCommand::CreateSnapshot { dry_run: true, .. });
    let result = apply_engine_command(cmd, &mut conn, &settings, executor)?;
    print_result(result, dry_run);
    Ok(())
}

/// Ask on stdout, read one line from stdin; only "yes" confirms.
fn confirm(question: &str) -> std::io::Result<bool> {
    println!("{} Type 'yes' to continue:", question);
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim() == "yes")
}

fn print_result(result: EngineCommandResult, dry_run: bool) {
    match result {
        EngineCommandResult::SnapshotCreated(r) => match (r.created, r.snapshot) {
            (false, _) => println!("No changes since the applied snapshot; nothing created"),
            (true, None) if dry_run => println!("Dry run: a snapshot would be created"),
            (true, Some(s)) => {
                println!("Snapshot created:");
                println!("  name: {}", s.name);
                println!("  members: {}", s.members().len());
                println!("  fingerprint: {}", s.fingerprint());
            }
            (true, None) => println!("Snapshot created"),
        },
        EngineCommandResult::CheckedOut(report) => print_checkout(&report),
        EngineCommandResult::Deleted { name, members } => {
            println!("Snapshot {} deleted ({} members)", name, members);
        }
        EngineCommandResult::HistoryDeleted { snapshots, members } => {
            println!(
                "Snapshot history deleted ({} snapshots, {} members)",
                snapshots, members
            );
        }
        EngineCommandResult::Snapshots(rows) => {
            if rows.is_empty() {
                println!("No snapshots");
            }
            for row in rows {
                let marker = if row.applied { "*" } else { " " };
                println!(
                    "{} {}  {}  {} members",
                    marker,
                    row.name,
                    row.created_at.format("%Y-%m-%d %H:%M:%S"),
                    row.member_count
                );
            }
        }
    }
}

fn print_checkout(report: &CheckoutReport) {
    if let Some(drift) = &report.drift {
        let verdict = if report.drift_discarded() {
            "discarded"
        } else {
            "detected, left in place"
        };
        println!(
            "Warning: drift from snapshot {} {} ({} ledger-only, {} snapshot-only)",
            drift.baseline,
            verdict,
            drift.only_in_ledger.len(),
            drift.only_in_baseline.len()
        );
        for pair in &drift.only_in_ledger {
            println!("  + {}", pair);
        }
        for pair in &drift.only_in_baseline {
            println!("  - {}", pair);
        }
    }
    match &report.outcome {
        CheckoutOutcome::NoOp { name } => {
            println!("Already at snapshot {}; nothing to do", name);
        }
        CheckoutOutcome::Committed { from, to } => {
            println!("Checked out snapshot {} (was {})", to, from);
        }
    }
}
