#![deny(unsafe_code)]

// Use mimalloc for reduced allocation latency (enabled by default).
#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod commands;
mod config;
mod exit_code;
mod output;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use oxmeta_core::ErrorKind;
use oxmeta_core::blob::StorageError;
use oxmeta_core::lock::LockError;
use oxmeta_core::metadata::MetadataError;
use oxmeta_core::service::ServiceError;

use crate::commands::{create, delete, discard, get, lock, reconcile, status, unlock, update};
use crate::config::Config;

/// Metadata storage and locking for end-to-end encrypted folders
#[derive(Parser)]
#[command(name = "oxmeta")]
#[command(author, version)]
#[command(propagate_version = true)]
#[command(after_help = "EXAMPLES:
    # Take the lock, stage metadata, commit it
    TOKEN=$(oxmeta lock --user alice 42)
    oxmeta create --user alice --token \"$TOKEN\" 42 < metadata.json
    oxmeta unlock --user alice --token \"$TOKEN\" 42

    # Read committed metadata
    oxmeta get --user alice 42

    # Inspect a folder
    oxmeta status --user alice 42 --json
")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file (default: <config dir>/oxmeta/config.toml)
    #[arg(long, env = "OXMETA_CONFIG", value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    // ============ Lock lifecycle ============
    /// Lock a folder and print the lock token
    Lock(lock::Args),

    /// Release a folder lock, committing (or aborting) staged changes
    Unlock(unlock::Args),

    // ============ Metadata ============
    /// Print committed metadata
    Get(get::Args),

    /// Stage initial metadata (requires the lock)
    Create(create::Args),

    /// Stage replacement metadata (requires the lock)
    Update(update::Args),

    /// Drop staged metadata (requires the lock)
    Discard(discard::Args),

    /// Remove all metadata of a folder (requires the lock)
    Delete(delete::Args),

    /// Show metadata state and lock of a folder
    Status(status::Args),

    // ============ Maintenance ============
    /// Finalize or revert tagged files in a folder
    Reconcile(reconcile::Args),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let quiet = cli.quiet;

    match run(cli) {
        Ok(()) => ExitCode::from(exit_code::SUCCESS),
        Err(e) => {
            if !quiet {
                eprintln!("Error: {e:#}");
            }
            ExitCode::from(categorize_error(&e))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up tracing based on verbosity (skip if quiet)
    if !cli.quiet {
        setup_tracing(cli.verbose);
    }

    let config = Config::load(cli.config.as_deref())?;
    tracing::debug!(?config, "Configuration loaded");

    match cli.command {
        Commands::Lock(args) => lock::execute(&config.build_service()?, &args),
        Commands::Unlock(args) => unlock::execute(&config.build_service()?, &args, cli.quiet),
        Commands::Get(args) => get::execute(&config.build_service()?, &args),
        Commands::Create(args) => create::execute(&config.build_service()?, &args),
        Commands::Update(args) => update::execute(&config.build_service()?, &args),
        Commands::Discard(args) => discard::execute(&config.build_service()?, &args),
        Commands::Delete(args) => delete::execute(&config.build_service()?, &args, cli.quiet),
        Commands::Status(args) => status::execute(&config.build_service()?, &args),
        // Only touches the files store; no metadata or locks involved.
        Commands::Reconcile(args) => reconcile::execute(&*config.open_files_store()?, &args, cli.quiet),
    }
}

/// Set up tracing/logging based on verbosity level
fn setup_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .init();
}

fn exit_code_for(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::NotFound | ErrorKind::MissingMetadata => exit_code::NOT_FOUND,
        ErrorKind::AlreadyExists | ErrorKind::NotLocked => exit_code::CONFLICT,
        ErrorKind::AlreadyLocked => exit_code::LOCKED,
        ErrorKind::WrongHolder | ErrorKind::NotAllowedToEdit => exit_code::PERMISSION_DENIED,
        ErrorKind::StorageFailure => exit_code::STORAGE_FAILED,
    }
}

/// Categorize an error into an exit code using typed error downcasting
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(err) = cause.downcast_ref::<ServiceError>() {
            return exit_code_for(err.kind());
        }
        if let Some(err) = cause.downcast_ref::<MetadataError>() {
            return exit_code_for(err.kind());
        }
        if let Some(err) = cause.downcast_ref::<LockError>() {
            return exit_code_for(err.kind());
        }
        if let Some(err) = cause.downcast_ref::<StorageError>() {
            return exit_code_for(err.kind());
        }
    }
    exit_code::GENERAL_ERROR
}
