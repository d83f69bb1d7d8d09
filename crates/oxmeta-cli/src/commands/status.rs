//! Status command - show a folder's metadata state and lock.
//!
//! # Examples
//!
//! ```bash
//! oxmeta status --user alice 42
//! oxmeta status --user alice 42 --json
//! ```

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use oxmeta_core::service::MetadataService;

use super::FolderArgs;
use crate::output::{create_table, format_duration};

#[derive(ClapArgs, Clone, Debug)]
pub struct Args {
    #[command(flatten)]
    pub folder: FolderArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[instrument(level = "info", name = "cmd::status", skip_all, fields(folder_id = args.folder.folder_id))]
pub fn execute(service: &MetadataService, args: &Args) -> Result<()> {
    let status = service.status(&args.folder.user_id(), args.folder.file_id())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let mut table = create_table();
    table.set_header(vec!["Property", "Value"]);
    table.add_row(vec!["Folder", &status.file_id.to_string()]);
    table.add_row(vec!["Metadata", &status.state.to_string()]);
    match &status.lock {
        Some(lock) => {
            let state = if lock.stale { "locked (stale)" } else { "locked" };
            table.add_row(vec!["Lock", state]);
            table.add_row(vec!["Locked since", &lock.acquired_at.to_rfc3339()]);
        }
        None => {
            table.add_row(vec!["Lock", "unlocked"]);
        }
    }
    table.add_row(vec!["Lock timeout", &format_duration(service.lock_timeout())]);
    println!("{table}");
    Ok(())
}
