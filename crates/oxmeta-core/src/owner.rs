//! Owner identity and folder resolution.
//!
//! Metadata is always addressed by an owner pair: the user whose tree holds the
//! folder and the folder's node id. [`OwnerResolver`] is the seam to whatever
//! knows which nodes live in which user's tree.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::blob::{BlobPath, NodeKind, StorageResult};

/// Opaque user identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        UserId::new(s)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        UserId(s)
    }
}

/// Node identifier of a file or folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(u64);

impl FileId {
    #[inline]
    pub const fn new(id: u64) -> Self {
        FileId(id)
    }

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for FileId {
    fn from(id: u64) -> Self {
        FileId(id)
    }
}

impl FromStr for FileId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(FileId)
    }
}

/// A node found in a user's tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedNode {
    pub file_id: FileId,
    /// Location of the node in the user-files blob store.
    pub path: BlobPath,
    pub kind: NodeKind,
}

/// Resolves users and the nodes inside their trees.
pub trait OwnerResolver: Send + Sync + fmt::Debug {
    /// Whether the user has a root folder at all.
    fn user_exists(&self, user_id: &UserId) -> StorageResult<bool>;

    /// Nodes with the given id inside the user's tree. Empty means not found.
    fn get_by_id(&self, user_id: &UserId, file_id: FileId) -> StorageResult<Vec<OwnedNode>>;
}

/// Resolver backed by an explicit ownership table.
///
/// Used by tests and by the CLI, which loads the table from its
/// configuration file.
#[derive(Debug, Default)]
pub struct StaticOwnerResolver {
    users: RwLock<HashMap<UserId, HashMap<FileId, OwnedNode>>>,
}

impl StaticOwnerResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user with an empty tree.
    pub fn add_user(&self, user_id: impl Into<UserId>) {
        self.users.write().entry(user_id.into()).or_default();
    }

    /// Register a folder in a user's tree, creating the user if needed.
    pub fn add_folder(&self, user_id: impl Into<UserId>, file_id: FileId, path: impl Into<BlobPath>) {
        let node = OwnedNode {
            file_id,
            path: path.into(),
            kind: NodeKind::Folder,
        };
        self.users
            .write()
            .entry(user_id.into())
            .or_default()
            .insert(file_id, node);
    }

    /// Builder-style variant of [`add_folder`](Self::add_folder).
    #[must_use]
    pub fn with_folder(self, user_id: impl Into<UserId>, file_id: FileId, path: impl Into<BlobPath>) -> Self {
        self.add_folder(user_id, file_id, path);
        self
    }
}

impl OwnerResolver for StaticOwnerResolver {
    fn user_exists(&self, user_id: &UserId) -> StorageResult<bool> {
        Ok(self.users.read().contains_key(user_id))
    }

    fn get_by_id(&self, user_id: &UserId, file_id: FileId) -> StorageResult<Vec<OwnedNode>> {
        Ok(self
            .users
            .read()
            .get(user_id)
            .and_then(|nodes| nodes.get(&file_id))
            .cloned()
            .into_iter()
            .collect())
    }
}
