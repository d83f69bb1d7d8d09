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

/// Drop staged metadata but keep the lock.
#[instrument(level = "info", name = "cmd::discard", skip_all, fields(folder_id = args.folder.folder_id))]
pub fn execute(service: &MetadataService, args: &Args) -> Result<()> {
    service.discard(&args.folder.user_id(), args.folder.file_id(), &args.token.lock_token())?;
    Ok(())
}
