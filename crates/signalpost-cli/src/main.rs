// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode as ProcessExitCode;

use clap::{ArgAction, Parser, Subcommand};
use serde_json::json;
use signalpost_ingest::{import_contacts_from_path, ImportSummary};
use signalpost_store::{MemoryStore, SqliteStore};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "signalpost")]
#[command(about = "Signalpost operations CLI")]
struct Cli {
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[arg(long, global = true, default_value_t = false)]
    quiet: bool,
    #[arg(long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bulk import data from external JSON dumps.
    Import {
        #[command(subcommand)]
        command: ImportCommand,
    },
}

#[derive(Subcommand)]
enum ImportCommand {
    /// Import contacts (with embedded media) from a JSON file.
    Contacts {
        /// PATH of the contacts JSON file to import.
        #[arg(long)]
        from: PathBuf,
        /// SQLite database to import into.
        #[arg(long, default_value = "signalpost.db")]
        db: PathBuf,
        /// Decode and report without writing to the database.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
}

fn init_tracing(quiet: bool, verbose: u8) {
    let default = if quiet {
        "error"
    } else if verbose > 0 {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_summary(summary: &ImportSummary, as_json: bool, dry_run: bool) {
    if as_json {
        println!(
            "{}",
            json!({
                "contacts": summary.contacts,
                "media": summary.media,
                "skipped": summary.skipped,
                "dry_run": dry_run,
            })
        );
    } else {
        let suffix = if dry_run { " (dry run)" } else { "" };
        println!(
            "imported {} contacts, {} media, skipped {} rows{suffix}",
            summary.contacts, summary.media, summary.skipped
        );
    }
}

fn run_import_contacts(
    from: &PathBuf,
    db: &PathBuf,
    dry_run: bool,
    as_json: bool,
) -> Result<(), String> {
    let summary = if dry_run {
        // A throwaway in-memory store exercises the full pipeline,
        // diagnostics included, without touching the database.
        let store = MemoryStore::new();
        import_contacts_from_path(from, &store).map_err(|e| e.to_string())?
    } else {
        let store = SqliteStore::open(db).map_err(|e| e.to_string())?;
        import_contacts_from_path(from, &store).map_err(|e| e.to_string())?
    };
    print_summary(&summary, as_json, dry_run);
    Ok(())
}

fn main() -> ProcessExitCode {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    let result = match &cli.command {
        Commands::Import { command } => match command {
            ImportCommand::Contacts { from, db, dry_run } => {
                run_import_contacts(from, db, *dry_run, cli.json)
            }
        },
    };

    match result {
        Ok(()) => ProcessExitCode::SUCCESS,
        Err(message) => {
            error!("{message}");
            ProcessExitCode::FAILURE
        }
    }
}
