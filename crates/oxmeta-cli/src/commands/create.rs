//! Create command - stage the first metadata of a folder.
//!
//! # Examples
//!
//! ```bash
//! oxmeta create --user alice --token "$TOKEN" 42 --file metadata.json
//! ```

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

#[instrument(level = "info", name = "cmd::create", skip_all, fields(folder_id = args.folder.folder_id))]
pub fn execute(service: &MetadataService, args: &Args) -> Result<()> {
    let content = args.content.read()?;
    service.create(
        &args.folder.user_id(),
        args.folder.file_id(),
        &args.token.lock_token(),
        &content,
    )?;
    Ok(())
}
