use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use oxmeta_core::service::MetadataService;

use super::{ContentArgs, FolderArgs, TokenArgs};

#[derive(ClapArgs, Clone, Debug)]
pub struct Args {
    #[command(flatten)]
    pub folder: FolderArgs,

    #[command(flatten)]
    pub token: TokenArgs,

    #[command(flatten)]
    pub content: ContentArgs,
}

/// Stage replacement metadata; readers keep seeing the old one until unlock.
#[instrument(level = "info", name = "cmd::update", skip_all, fields(folder_id = args.folder.folder_id))]
pub fn execute(service: &MetadataService, args: &Args) -> Result<()> {
    let content = args.content.read()?;
    service.update(
        &args.folder.user_id(),
        args.folder.file_id(),
        &args.token.lock_token(),
        &content,
    )?;
    Ok(())
}
