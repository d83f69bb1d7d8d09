//! Blob store backed by a directory on the local filesystem.
//!
//! Content writes go through a named temp file created next to the target,
//! which is then moved into place. Readers therefore see either the old
//! content or the complete new content, never a partial write.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{instrument, trace};

use super::{BlobPath, BlobStore, Node, NodeKind, StorageError, StorageResult};

/// Prefix for in-flight temp files. Entries with this prefix are hidden from listings.
const TEMP_PREFIX: &str = ".oxmeta-tmp-";

/// Blob store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StorageError::from_io(e, &BlobPath::root()))?;
        Ok(Self { root })
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a blob path onto the local filesystem.
    fn local_path(&self, path: &BlobPath) -> StorageResult<PathBuf> {
        if path.escapes_root() {
            return Err(StorageError::InvalidPath {
                path: path.clone(),
                reason: "path escapes the store root".to_string(),
            });
        }
        Ok(path.as_relative_path().to_path(&self.root))
    }

    fn local_parent(&self, path: &BlobPath) -> StorageResult<PathBuf> {
        let parent = path.parent().ok_or_else(|| StorageError::InvalidPath {
            path: path.clone(),
            reason: "the root is not a file".to_string(),
        })?;
        let local = self.local_path(&parent)?;
        match fs::metadata(&local) {
            Ok(meta) if meta.is_dir() => Ok(local),
            Ok(_) => Err(StorageError::NotAFolder { path: parent }),
            Err(e) => Err(StorageError::from_io(e, &parent)),
        }
    }

    fn stat(&self, path: &BlobPath) -> StorageResult<Option<NodeKind>> {
        let local = self.local_path(path)?;
        match fs::symlink_metadata(&local) {
            Ok(meta) if meta.is_dir() => Ok(Some(NodeKind::Folder)),
            Ok(_) => Ok(Some(NodeKind::File)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::from_io(e, path)),
        }
    }

    /// Write `content` into a temp file in `dir`, ready to be persisted.
    fn stage_temp(dir: &Path, content: &[u8], path: &BlobPath) -> StorageResult<tempfile::NamedTempFile> {
        let mut temp_file = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(dir)
            .map_err(|e| StorageError::from_io(e, path))?;
        temp_file
            .write_all(content)
            .and_then(|()| temp_file.as_file().sync_all())
            .map_err(|e| StorageError::Io {
                source: e,
                path: path.clone(),
            })?;
        Ok(temp_file)
    }
}

impl BlobStore for FsBlobStore {
    fn node_kind(&self, path: &BlobPath) -> StorageResult<Option<NodeKind>> {
        self.stat(path)
    }

    #[instrument(level = "trace", skip(self), fields(path = %path))]
    fn create_folder(&self, path: &BlobPath) -> StorageResult<()> {
        let local = self.local_path(path)?;
        match self.stat(path)? {
            Some(NodeKind::Folder) => return Err(StorageError::AlreadyExists { path: path.clone() }),
            Some(NodeKind::File) => return Err(StorageError::NotAFolder { path: path.clone() }),
            None => {}
        }
        if let Some(parent) = local.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::from_io(e, path))?;
        }
        // create_dir (not create_dir_all) so a concurrent creator is reported.
        fs::create_dir(&local).map_err(|e| StorageError::from_io(e, path))
    }

    fn list(&self, path: &BlobPath) -> StorageResult<Vec<Node>> {
        match self.stat(path)? {
            Some(NodeKind::Folder) => {}
            Some(NodeKind::File) => return Err(StorageError::NotAFolder { path: path.clone() }),
            None => return Err(StorageError::NotFound { path: path.clone() }),
        }
        let local = self.local_path(path)?;
        let entries = fs::read_dir(&local).map_err(|e| StorageError::from_io(e, path))?;

        let mut nodes = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::from_io(e, path))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(TEMP_PREFIX) {
                continue;
            }
            let file_type = entry.file_type().map_err(|e| StorageError::from_io(e, path))?;
            let kind = if file_type.is_dir() {
                NodeKind::Folder
            } else {
                NodeKind::File
            };
            nodes.push(Node::new(path.join(&name), kind));
        }
        nodes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(nodes)
    }

    fn read(&self, path: &BlobPath) -> StorageResult<Vec<u8>> {
        if self.stat(path)? == Some(NodeKind::Folder) {
            return Err(StorageError::NotAFile { path: path.clone() });
        }
        let local = self.local_path(path)?;
        fs::read(&local).map_err(|e| StorageError::from_io(e, path))
    }

    #[instrument(level = "trace", skip(self, content), fields(path = %path, content_len = content.len()))]
    fn create(&self, path: &BlobPath, content: &[u8]) -> StorageResult<()> {
        let dir = self.local_parent(path)?;
        let local = self.local_path(path)?;
        let temp_file = Self::stage_temp(&dir, content, path)?;
        // No-clobber persist is an atomic create-if-absent.
        temp_file
            .persist_noclobber(&local)
            .map_err(|e| StorageError::from_io(e.error, path))?;
        trace!("Created blob");
        Ok(())
    }

    #[instrument(level = "trace", skip(self, content), fields(path = %path, content_len = content.len()))]
    fn write(&self, path: &BlobPath, content: &[u8]) -> StorageResult<()> {
        if self.stat(path)? == Some(NodeKind::Folder) {
            return Err(StorageError::NotAFile { path: path.clone() });
        }
        let dir = self.local_parent(path)?;
        let local = self.local_path(path)?;
        let temp_file = Self::stage_temp(&dir, content, path)?;
        temp_file.persist(&local).map_err(|e| StorageError::Io {
            source: e.error,
            path: path.clone(),
        })?;
        trace!("Wrote blob");
        Ok(())
    }

    #[instrument(level = "trace", skip(self), fields(from = %from, to = %to))]
    fn rename(&self, from: &BlobPath, to: &BlobPath) -> StorageResult<()> {
        let Some(source_kind) = self.stat(from)? else {
            return Err(StorageError::NotFound { path: from.clone() });
        };
        if from == to {
            return Ok(());
        }
        self.local_parent(to)?;
        match self.stat(to)? {
            Some(NodeKind::Folder) => return Err(StorageError::AlreadyExists { path: to.clone() }),
            Some(NodeKind::File) if source_kind == NodeKind::Folder => {
                return Err(StorageError::AlreadyExists { path: to.clone() });
            }
            _ => {}
        }
        let local_from = self.local_path(from)?;
        let local_to = self.local_path(to)?;
        fs::rename(&local_from, &local_to).map_err(|e| StorageError::Io {
            source: e,
            path: from.clone(),
        })
    }

    #[instrument(level = "trace", skip(self), fields(path = %path))]
    fn remove(&self, path: &BlobPath) -> StorageResult<()> {
        if path.is_root() {
            return Err(StorageError::InvalidPath {
                path: path.clone(),
                reason: "the root cannot be removed".to_string(),
            });
        }
        let local = self.local_path(path)?;
        match self.stat(path)? {
            Some(NodeKind::Folder) => {
                fs::remove_dir_all(&local).map_err(|e| StorageError::from_io(e, path))
            }
            Some(NodeKind::File) => fs::remove_file(&local).map_err(|e| StorageError::from_io(e, path)),
            None => Err(StorageError::NotFound { path: path.clone() }),
        }
    }
}
