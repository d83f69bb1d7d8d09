use std::io::{self, Write};

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use oxmeta_core::service::MetadataService;

use super::FolderArgs;

#[derive(ClapArgs, Clone, Debug)]
pub struct Args {
    #[command(flatten)]
    pub folder: FolderArgs,
}

/// Write the committed metadata to stdout, byte for byte.
#[instrument(level = "info", name = "cmd::get", skip_all, fields(folder_id = args.folder.folder_id))]
pub fn execute(service: &MetadataService, args: &Args) -> Result<()> {
    let content = service.get(&args.folder.user_id(), args.folder.file_id())?;
    let mut stdout = io::stdout().lock();
    stdout.write_all(&content)?;
    stdout.flush()?;
    Ok(())
}
