//! Hierarchical blob store abstraction.
//!
//! The metadata protocol and the reconciliation routine only need a handful of
//! primitives from the underlying storage: create/read/replace a file,
//! create/list/remove a folder, and rename a node. [`BlobStore`] captures that
//! capability set; every call is individually atomic, but no multi-call
//! transaction is offered.
//!
//! On top of the raw primitives, [`BlobStoreExt`] provides the folder/file
//! handle API ([`Folder`], [`File`]) that the metadata store is written
//! against.
//!
//! # Backends
//!
//! - [`MemoryBlobStore`] - in-process store for tests and embedding
//! - [`FsBlobStore`] - maps blob paths onto a directory on the local filesystem

pub mod filesystem;
pub mod memory;
pub mod path;

pub use filesystem::FsBlobStore;
pub use memory::MemoryBlobStore;
pub use path::BlobPath;

use std::fmt;
use thiserror::Error;

use crate::error::ErrorKind;

/// Errors reported by blob store backends.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Node not found: '{path}'")]
    NotFound { path: BlobPath },

    #[error("Node already exists: '{path}'")]
    AlreadyExists { path: BlobPath },

    #[error("Expected folder but found file: '{path}'")]
    NotAFolder { path: BlobPath },

    #[error("Expected file but found folder: '{path}'")]
    NotAFile { path: BlobPath },

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: BlobPath, reason: String },

    #[error("IO error for '{path}': {source}")]
    Io {
        #[source]
        source: std::io::Error,
        path: BlobPath,
    },

    #[error("Corrupt data at '{path}': {reason}")]
    Corrupt { path: BlobPath, reason: String },
}

impl StorageError {
    /// Wrap an I/O error, translating the kinds that have a storage meaning.
    pub fn from_io(source: std::io::Error, path: &BlobPath) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound { path: path.clone() },
            std::io::ErrorKind::AlreadyExists => StorageError::AlreadyExists { path: path.clone() },
            _ => StorageError::Io {
                source,
                path: path.clone(),
            },
        }
    }

    /// Whether this error means the node does not exist.
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }

    /// Whether this error means the node already exists.
    #[inline]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, StorageError::AlreadyExists { .. })
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::NotFound { .. } => ErrorKind::NotFound,
            StorageError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            _ => ErrorKind::StorageFailure,
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Kind of node stored at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    File,
    Folder,
}

/// A direct child of a folder, as returned by [`BlobStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Final path component.
    pub name: String,
    /// Full path of the node.
    pub path: BlobPath,
    pub kind: NodeKind,
}

impl Node {
    pub fn new(path: BlobPath, kind: NodeKind) -> Self {
        let name = path.file_name().unwrap_or_default().to_string();
        Self { name, path, kind }
    }
}

/// Capability set of a hierarchical blob store.
///
/// Implementations must make each call atomic on its own. In particular
/// [`create`](BlobStore::create) must be an atomic create-if-absent and
/// [`write`](BlobStore::write) must never expose partially written content.
pub trait BlobStore: Send + Sync + fmt::Debug {
    /// Kind of the node at `path`, or `None` if nothing is stored there.
    fn node_kind(&self, path: &BlobPath) -> StorageResult<Option<NodeKind>>;

    /// Create a folder and any missing parents.
    ///
    /// Fails with [`StorageError::AlreadyExists`] if the folder already exists.
    fn create_folder(&self, path: &BlobPath) -> StorageResult<()>;

    /// List the direct children of a folder, sorted by name.
    fn list(&self, path: &BlobPath) -> StorageResult<Vec<Node>>;

    /// Read the full content of a file.
    fn read(&self, path: &BlobPath) -> StorageResult<Vec<u8>>;

    /// Create a new file with the given content, failing with
    /// [`StorageError::AlreadyExists`] if any node is already at `path`.
    fn create(&self, path: &BlobPath, content: &[u8]) -> StorageResult<()>;

    /// Create or replace a file with the given content.
    fn write(&self, path: &BlobPath, content: &[u8]) -> StorageResult<()>;

    /// Move a node. An existing file at `to` is replaced; an existing folder
    /// at `to` yields [`StorageError::AlreadyExists`].
    fn rename(&self, from: &BlobPath, to: &BlobPath) -> StorageResult<()>;

    /// Remove a file, or a folder with everything beneath it.
    fn remove(&self, path: &BlobPath) -> StorageResult<()>;
}

/// Folder/file handle API over any [`BlobStore`].
pub trait BlobStoreExt: BlobStore {
    /// Open an existing folder.
    fn get_folder(&self, path: &BlobPath) -> StorageResult<Folder<'_, Self>> {
        match self.node_kind(path)? {
            Some(NodeKind::Folder) => Ok(Folder {
                store: self,
                path: path.clone(),
            }),
            Some(NodeKind::File) => Err(StorageError::NotAFolder { path: path.clone() }),
            None => Err(StorageError::NotFound { path: path.clone() }),
        }
    }

    /// Create a folder (and its parents) and return a handle to it.
    fn new_folder(&self, path: &BlobPath) -> StorageResult<Folder<'_, Self>> {
        self.create_folder(path)?;
        Ok(Folder {
            store: self,
            path: path.clone(),
        })
    }

    /// Handle to the root folder.
    fn root_folder(&self) -> Folder<'_, Self> {
        Folder {
            store: self,
            path: BlobPath::root(),
        }
    }
}

impl<S: BlobStore + ?Sized> BlobStoreExt for S {}

/// Handle to a folder in a blob store.
///
/// A handle does not pin the folder: another writer may remove it, in which
/// case subsequent calls report [`StorageError::NotFound`].
pub struct Folder<'a, S: ?Sized> {
    store: &'a S,
    path: BlobPath,
}

impl<'a, S: BlobStore + ?Sized> Folder<'a, S> {
    #[inline]
    pub fn path(&self) -> &BlobPath {
        &self.path
    }

    /// Whether a node named `name` exists in this folder.
    ///
    /// `name` may itself be a relative path.
    pub fn file_exists(&self, name: &str) -> StorageResult<bool> {
        Ok(self.store.node_kind(&self.path.join(name))?.is_some())
    }

    /// Open an existing file in this folder.
    pub fn get_file(&self, name: &str) -> StorageResult<File<'a, S>> {
        let path = self.path.join(name);
        match self.store.node_kind(&path)? {
            Some(NodeKind::File) => Ok(File {
                store: self.store,
                path,
            }),
            Some(NodeKind::Folder) => Err(StorageError::NotAFile { path }),
            None => Err(StorageError::NotFound { path }),
        }
    }

    /// Create a new file, failing if one already exists.
    pub fn new_file(&self, name: &str, content: &[u8]) -> StorageResult<File<'a, S>> {
        let path = self.path.join(name);
        self.store.create(&path, content)?;
        Ok(File {
            store: self.store,
            path,
        })
    }

    /// Create or replace a file.
    pub fn put_file(&self, name: &str, content: &[u8]) -> StorageResult<File<'a, S>> {
        let path = self.path.join(name);
        self.store.write(&path, content)?;
        Ok(File {
            store: self.store,
            path,
        })
    }

    /// Direct children of this folder.
    pub fn listing(&self) -> StorageResult<Vec<Node>> {
        self.store.list(&self.path)
    }

    /// Remove this folder and everything beneath it.
    pub fn delete(self) -> StorageResult<()> {
        self.store.remove(&self.path)
    }
}

impl<S: ?Sized> fmt::Debug for Folder<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Folder").field("path", &self.path).finish()
    }
}

/// Handle to a file in a blob store.
pub struct File<'a, S: ?Sized> {
    store: &'a S,
    path: BlobPath,
}

impl<S: BlobStore + ?Sized> File<'_, S> {
    #[inline]
    pub fn path(&self) -> &BlobPath {
        &self.path
    }

    pub fn name(&self) -> &str {
        self.path.file_name().unwrap_or_default()
    }

    pub fn content(&self) -> StorageResult<Vec<u8>> {
        self.store.read(&self.path)
    }

    /// Replace the file's content.
    pub fn put_content(&self, content: &[u8]) -> StorageResult<()> {
        self.store.write(&self.path, content)
    }

    pub fn delete(self) -> StorageResult<()> {
        self.store.remove(&self.path)
    }
}

impl<S: ?Sized> fmt::Debug for File<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File").field("path", &self.path).finish()
    }
}
