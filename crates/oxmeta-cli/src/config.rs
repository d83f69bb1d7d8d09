//! Configuration file support for the oxmeta CLI.
//!
//! The file is looked up in this order:
//!
//! 1. `--config <PATH>`
//! 2. `$OXMETA_CONFIG`
//! 3. `<config dir>/oxmeta/config.toml` (e.g. `~/.config/oxmeta/config.toml`)
//!
//! A missing default file means built-in defaults; an explicitly named file
//! must exist.
//!
//! # Example configuration
//!
//! ```toml
//! app_data_dir = "/srv/oxmeta/appdata"
//! files_dir = "/srv/oxmeta/files"
//! lock_dir = "/srv/oxmeta/locks"
//! lock_timeout = "30m"
//!
//! [[owners]]
//! user = "alice"
//! file_id = 42
//! path = "alice/files/secret"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use oxmeta_core::blob::{BlobStore, FsBlobStore};
use oxmeta_core::lock::{DEFAULT_LOCK_TIMEOUT, FsLockBackend, LockManager};
use oxmeta_core::metadata::MetadataStore;
use oxmeta_core::owner::{FileId, StaticOwnerResolver};
use oxmeta_core::service::MetadataService;

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Root of the app-data blob store (holds `meta-data/`)
    pub app_data_dir: PathBuf,

    /// Root of the user-files blob store
    pub files_dir: PathBuf,

    /// Directory for lock records
    pub lock_dir: PathBuf,

    /// Age after which a lock may be taken over
    #[serde(with = "humantime_serde")]
    pub lock_timeout: Duration,

    /// Folder ownership table
    pub owners: Vec<OwnerEntry>,
}

/// One folder in a user's tree
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OwnerEntry {
    pub user: String,
    pub file_id: u64,
    /// Folder path inside the user-files store
    pub path: String,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            app_data_dir: data_dir.join("appdata"),
            files_dir: data_dir.join("files"),
            lock_dir: data_dir.join("locks"),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            owners: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from `explicit`, or from the default path.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = config_path()?;
                if !path.exists() {
                    tracing::debug!(path = %path.display(), "No config file, using defaults");
                    return Ok(Config::default());
                }
                path
            }
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Build the ownership table.
    pub fn owner_resolver(&self) -> StaticOwnerResolver {
        let resolver = StaticOwnerResolver::new();
        for entry in &self.owners {
            resolver.add_folder(entry.user.as_str(), FileId::new(entry.file_id), entry.path.as_str());
        }
        resolver
    }

    /// Open the on-disk stores.
    pub fn open_files_store(&self) -> Result<Arc<dyn BlobStore>> {
        let store = FsBlobStore::open(&self.files_dir)
            .with_context(|| format!("Failed to open files store: {}", self.files_dir.display()))?;
        Ok(Arc::new(store))
    }

    /// Wire up the metadata service over the configured directories.
    pub fn build_service(&self) -> Result<MetadataService> {
        let app_data = FsBlobStore::open(&self.app_data_dir)
            .with_context(|| format!("Failed to open app-data store: {}", self.app_data_dir.display()))?;
        let lock_backend = FsLockBackend::open(&self.lock_dir)
            .with_context(|| format!("Failed to open lock directory: {}", self.lock_dir.display()))?;

        let metadata = MetadataStore::new(Arc::new(app_data), Arc::new(self.owner_resolver()));
        Ok(
            MetadataService::new(metadata, LockManager::new(Arc::new(lock_backend)), self.open_files_store()?)
                .with_lock_timeout(self.lock_timeout),
        )
    }
}

/// Get the path to the default configuration file.
pub fn config_path() -> Result<PathBuf> {
    let base_dirs = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    Ok(base_dirs.config_dir().join("oxmeta").join("config.toml"))
}

/// Default root for all stores when the config names none.
fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "oxmeta")
        .map_or_else(|| PathBuf::from(".oxmeta"), |dirs| dirs.data_dir().to_path_buf())
}
