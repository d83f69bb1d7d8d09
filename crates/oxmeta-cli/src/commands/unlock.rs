//! Unlock command - release a folder's lock.
//!
//! Staged metadata is committed and `.e2e-to-save` / `.e2e-to-delete` files
//! are finalized, unless `--abort` is given, in which case both are rolled
//! back.

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use oxmeta_core::service::MetadataService;

use super::{FolderArgs, TokenArgs};

#[derive(ClapArgs, Clone, Debug)]
pub struct Args {
    #[command(flatten)]
    pub folder: FolderArgs,

    #[command(flatten)]
    pub token: TokenArgs,

    /// Discard staged changes instead of committing them
    #[arg(long)]
    pub abort: bool,
}

#[instrument(level = "info", name = "cmd::unlock", skip_all, fields(folder_id = args.folder.folder_id, abort = args.abort))]
pub fn execute(service: &MetadataService, args: &Args, quiet: bool) -> Result<()> {
    service.unlock(
        &args.folder.user_id(),
        args.folder.file_id(),
        &args.token.lock_token(),
        args.abort,
    )?;
    if !quiet {
        let verb = if args.abort { "aborted" } else { "committed" };
        eprintln!("Unlocked folder {} (changes {verb})", args.folder.folder_id);
    }
    Ok(())
}
