//! Request-level operations on end-to-end encrypted folder metadata.
//!
//! [`MetadataService`] ties the [`MetadataStore`], the [`LockManager`] and the
//! user-files blob store together and enforces the write rule: only the client
//! holding a folder's lock may change its metadata. Releasing the lock either
//! commits everything staged while it was held or throws it away.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use oxmeta_core::blob::{BlobPath, BlobStore, MemoryBlobStore};
//! use oxmeta_core::lock::LockManager;
//! use oxmeta_core::metadata::MetadataStore;
//! use oxmeta_core::owner::{FileId, StaticOwnerResolver, UserId};
//! use oxmeta_core::service::MetadataService;
//!
//! let files = Arc::new(MemoryBlobStore::new());
//! files.create_folder(&BlobPath::new("alice/files/secret")).unwrap();
//! let owners = Arc::new(StaticOwnerResolver::new().with_folder("alice", FileId::new(7), "alice/files/secret"));
//! let metadata = MetadataStore::new(Arc::new(MemoryBlobStore::new()), owners);
//! let service = MetadataService::new(metadata, LockManager::in_memory(), files);
//!
//! let alice = UserId::new("alice");
//! let folder = FileId::new(7);
//! let token = service.lock(&alice, folder, None).unwrap();
//! service.create(&alice, folder, &token, b"{\"keys\":[]}").unwrap();
//! service.unlock(&alice, folder, &token, false).unwrap();
//!
//! assert_eq!(service.get(&alice, folder).unwrap(), b"{\"keys\":[]}");
//! ```

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::blob::{BlobStore, StorageError};
use crate::error::ErrorKind;
use crate::lock::{DEFAULT_LOCK_TIMEOUT, LockError, LockManager, LockToken};
use crate::metadata::{MetadataError, MetadataState, MetadataStore};
use crate::owner::{FileId, UserId};
use crate::reconcile;

/// Any failure of a service operation.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Metadata(e) => e.kind(),
            ServiceError::Lock(e) => e.kind(),
            ServiceError::Storage(e) => e.kind(),
        }
    }

    /// Message suitable for the client.
    pub fn reason(&self) -> Cow<'_, str> {
        match self {
            ServiceError::Metadata(e) => e.reason(),
            other => Cow::Owned(other.to_string()),
        }
    }
}

/// Lock information safe to show to anyone; the token is left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockStatus {
    pub acquired_at: DateTime<Utc>,
    /// Older than the timeout, so the next `lock` call will take it over.
    pub stale: bool,
}

/// Snapshot of a folder's metadata and lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderStatus {
    pub file_id: FileId,
    pub state: MetadataState,
    pub lock: Option<LockStatus>,
}

/// Lock-checked metadata operations.
#[derive(Debug, Clone)]
pub struct MetadataService {
    metadata: MetadataStore,
    locks: LockManager,
    files: Arc<dyn BlobStore>,
    lock_timeout: Duration,
}

impl MetadataService {
    pub fn new(metadata: MetadataStore, locks: LockManager, files: Arc<dyn BlobStore>) -> Self {
        Self {
            metadata,
            locks,
            files,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    #[inline]
    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    #[inline]
    pub fn locks(&self) -> &LockManager {
        &self.locks
    }

    #[inline]
    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Lock a folder, generating a token when the client did not bring one.
    #[instrument(level = "debug", skip_all, fields(user = %user_id, file_id = %file_id))]
    pub fn lock(
        &self,
        user_id: &UserId,
        file_id: FileId,
        token: Option<LockToken>,
    ) -> Result<LockToken, ServiceError> {
        self.metadata.verify_owner(user_id, file_id)?;
        let token = token.unwrap_or_else(LockToken::generate);
        self.locks.acquire(file_id, &token, self.lock_timeout)?;
        Ok(token)
    }

    /// Release a folder's lock.
    ///
    /// Without `abort`, staged metadata is committed and tagged files are
    /// finalized. With `abort`, staged metadata is discarded and tagged files
    /// are reverted. The lock is released only once that succeeded.
    #[instrument(level = "debug", skip_all, fields(user = %user_id, file_id = %file_id, abort = abort))]
    pub fn unlock(
        &self,
        user_id: &UserId,
        file_id: FileId,
        token: &LockToken,
        abort: bool,
    ) -> Result<(), ServiceError> {
        let node = self.metadata.verify_owner(user_id, file_id)?;
        match self.locks.is_locked(file_id)? {
            None => return Err(LockError::NotLocked { folder_id: file_id }.into()),
            Some(record) if !record.is_held_by(token) => {
                warn!("Unlock attempted with a foreign token");
                return Err(LockError::WrongHolder { folder_id: file_id }.into());
            }
            Some(_) => {}
        }

        let reconciled = if abort {
            self.metadata.discard_staged(user_id, file_id)?;
            reconcile::revert_changes(&*self.files, &node.path)
        } else {
            match self.metadata.commit(user_id, file_id) {
                Ok(()) => {}
                Err(MetadataError::MissingMetadata { .. }) => debug!("Nothing staged to commit"),
                Err(e) => return Err(e.into()),
            }
            reconcile::finalize_changes(&*self.files, &node.path)
        };
        match reconciled {
            Ok(_) => {}
            // A folder without a counterpart in the files store has nothing to reconcile.
            Err(e) if e.is_not_found() => warn!(path = %node.path, "Folder missing from files store"),
            Err(e) => return Err(e.into()),
        }

        self.locks.release(file_id, token)?;
        info!(abort, "Folder unlocked");
        Ok(())
    }

    /// Read committed metadata. No lock needed.
    pub fn get(&self, user_id: &UserId, file_id: FileId) -> Result<Vec<u8>, ServiceError> {
        Ok(self.metadata.get(user_id, file_id)?)
    }

    /// Stage initial metadata.
    pub fn create(
        &self,
        user_id: &UserId,
        file_id: FileId,
        token: &LockToken,
        content: &[u8],
    ) -> Result<(), ServiceError> {
        self.locks.ensure_holder(file_id, token)?;
        Ok(self.metadata.create_staged(user_id, file_id, content)?)
    }

    /// Stage replacement metadata.
    pub fn update(
        &self,
        user_id: &UserId,
        file_id: FileId,
        token: &LockToken,
        content: &[u8],
    ) -> Result<(), ServiceError> {
        self.locks.ensure_holder(file_id, token)?;
        Ok(self.metadata.update_staged(user_id, file_id, content)?)
    }

    /// Drop staged metadata without releasing the lock.
    pub fn discard(&self, user_id: &UserId, file_id: FileId, token: &LockToken) -> Result<(), ServiceError> {
        self.locks.ensure_holder(file_id, token)?;
        Ok(self.metadata.discard_staged(user_id, file_id)?)
    }

    /// Remove all metadata of the folder.
    pub fn delete(&self, user_id: &UserId, file_id: FileId, token: &LockToken) -> Result<(), ServiceError> {
        self.locks.ensure_holder(file_id, token)?;
        Ok(self.metadata.delete(user_id, file_id)?)
    }

    pub fn status(&self, user_id: &UserId, file_id: FileId) -> Result<FolderStatus, ServiceError> {
        let state = self.metadata.state(user_id, file_id)?;
        let now = Utc::now();
        let lock = self.locks.is_locked(file_id)?.map(|record| LockStatus {
            stale: record.is_stale(self.lock_timeout, now),
            acquired_at: record.acquired_at,
        });
        Ok(FolderStatus { file_id, state, lock })
    }
}
