//! Subcommand implementations.

pub mod create;
pub mod delete;
pub mod discard;
pub mod get;
pub mod lock;
pub mod reconcile;
pub mod status;
pub mod unlock;
pub mod update;

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args as ClapArgs;

use oxmeta_core::lock::LockToken;
use oxmeta_core::owner::{FileId, UserId};

/// Identifies a folder by its owner and node id
#[derive(ClapArgs, Clone, Debug)]
pub struct FolderArgs {
    /// User whose tree holds the folder
    #[arg(short, long, env = "OXMETA_USER")]
    pub user: String,

    /// Node id of the end-to-end encrypted folder
    #[arg(value_name = "FOLDER_ID")]
    pub folder_id: u64,
}

impl FolderArgs {
    pub fn user_id(&self) -> UserId {
        UserId::new(self.user.as_str())
    }

    pub fn file_id(&self) -> FileId {
        FileId::new(self.folder_id)
    }
}

/// Lock token proving the caller holds the folder lock
#[derive(ClapArgs, Clone, Debug)]
pub struct TokenArgs {
    /// Token returned by `oxmeta lock`
    #[arg(short, long, env = "OXMETA_TOKEN", hide_env_values = true)]
    pub token: String,
}

impl TokenArgs {
    pub fn lock_token(&self) -> LockToken {
        LockToken::new(self.token.as_str())
    }
}

/// Where staged metadata content comes from
#[derive(ClapArgs, Clone, Debug)]
pub struct ContentArgs {
    /// Read metadata from this file instead of stdin
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

impl ContentArgs {
    pub fn read(&self) -> Result<Vec<u8>> {
        match &self.file {
            Some(path) => read_file(path),
            None => read_stdin(),
        }
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read metadata file: {}", path.display()))
}

fn read_stdin() -> Result<Vec<u8>> {
    if io::stdin().is_terminal() {
        anyhow::bail!(
            "Metadata must be piped in or given with --file.\n\
             Example: oxmeta create --user alice --token \"$TOKEN\" 42 < metadata.json"
        );
    }
    let mut content = Vec::new();
    io::stdin()
        .read_to_end(&mut content)
        .context("Failed to read metadata from stdin")?;
    Ok(content)
}
