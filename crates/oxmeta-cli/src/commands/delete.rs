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
}

/// Remove all metadata of a folder, committed and staged.
#[instrument(level = "info", name = "cmd::delete", skip_all, fields(folder_id = args.folder.folder_id))]
pub fn execute(service: &MetadataService, args: &Args, quiet: bool) -> Result<()> {
    service.delete(&args.folder.user_id(), args.folder.file_id(), &args.token.lock_token())?;
    if !quiet {
        eprintln!("Deleted metadata of folder {}", args.folder.folder_id);
    }
    Ok(())
}
