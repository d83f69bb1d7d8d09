//! Reconcile command - resolve tagged files in a folder without a lock cycle.
//!
//! Useful for cleaning up after a client that disappeared mid-upload.
//!
//! # Examples
//!
//! ```bash
//! oxmeta reconcile alice/files/secret --revert
//! ```

use anyhow::{Context, Result};
use clap::{ArgGroup, Args as ClapArgs};
use tracing::instrument;

use oxmeta_core::blob::{BlobPath, BlobStore};
use oxmeta_core::reconcile::{finalize_changes, revert_changes};

#[derive(ClapArgs, Clone, Debug)]
#[command(group(ArgGroup::new("mode").required(true).args(["finalize", "revert"])))]
pub struct Args {
    /// Folder path inside the files store
    pub path: String,

    /// Apply pending saves and deletions
    #[arg(long)]
    pub finalize: bool,

    /// Roll back pending saves and deletions
    #[arg(long)]
    pub revert: bool,
}

#[instrument(level = "info", name = "cmd::reconcile", skip_all, fields(path = %args.path))]
pub fn execute(files: &dyn BlobStore, args: &Args, quiet: bool) -> Result<()> {
    let folder = BlobPath::new(&args.path);
    let changed = if args.finalize {
        finalize_changes(files, &folder)
    } else {
        revert_changes(files, &folder)
    }
    .with_context(|| format!("Failed to reconcile {folder}"))?;

    if !quiet {
        if changed {
            eprintln!("Reconciled {folder}");
        } else {
            eprintln!("Nothing to reconcile in {folder}");
        }
    }
    Ok(())
}
