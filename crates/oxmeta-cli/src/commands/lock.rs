//! Lock command - take a folder's lock and print its token.
//!
//! # Examples
//!
//! ```bash
//! TOKEN=$(oxmeta lock --user alice 42)
//! ```

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use oxmeta_core::lock::LockToken;
use oxmeta_core::service::MetadataService;

use super::FolderArgs;

#[derive(ClapArgs, Clone, Debug)]
pub struct Args {
    #[command(flatten)]
    pub folder: FolderArgs,

    /// Use this token instead of generating one
    #[arg(short, long)]
    pub token: Option<String>,
}

#[instrument(level = "info", name = "cmd::lock", skip_all, fields(folder_id = args.folder.folder_id))]
pub fn execute(service: &MetadataService, args: &Args) -> Result<()> {
    let token = service.lock(
        &args.folder.user_id(),
        args.folder.file_id(),
        args.token.as_deref().map(LockToken::new),
    )?;
    println!("{}", token.as_str());
    Ok(())
}
