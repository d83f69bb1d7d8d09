//! Per-folder exclusive locks.
//!
//! A client must hold the lock of an end-to-end encrypted folder before it may
//! stage, commit or discard that folder's metadata. A lock is an opaque
//! [`LockToken`] plus the time it was taken; a lock older than the configured
//! timeout is considered abandoned and may be taken over by the next
//! [`LockManager::acquire`].
//!
//! # Atomicity
//!
//! Every check-then-change goes through [`LockBackend::update`], which runs
//! the decision closure atomically per folder. Concurrent acquires of the same
//! folder therefore produce exactly one winner.
//!
//! # Backends
//!
//! - [`MemoryLockBackend`] - process-local, `DashMap` based
//! - [`FsLockBackend`] - one JSON record per folder on disk, guarded by an
//!   advisory file lock so several processes can share it

pub mod backend;
pub mod filesystem;

pub use backend::{LockBackend, LockUpdate, MemoryLockBackend};
pub use filesystem::FsLockBackend;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::blob::{BlobPath, StorageError};
use crate::error::ErrorKind;
use crate::owner::FileId;

/// Age after which a lock may be reclaimed by another client.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Length of generated tokens, in alphanumeric characters.
pub const TOKEN_LEN: usize = 64;

pub const MSG_NOT_ALLOWED_TO_EDIT: &str =
    "You are not allowed to edit the file, make sure to first lock it, and then send the right token";
pub const MSG_WRONG_HOLDER: &str = "You are not allowed to remove the lock";

/// Opaque secret proving lock ownership.
///
/// Compared in constant time and never printed by `Debug`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockToken(String);

impl LockToken {
    /// Wrap a token received from a client.
    pub fn new(token: impl Into<String>) -> Self {
        LockToken(token.into())
    }

    /// Generate a fresh random token.
    pub fn generate() -> Self {
        let token: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();
        LockToken(token)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for LockToken {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl Eq for LockToken {}

impl fmt::Debug for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LockToken(<redacted>)")
    }
}

impl From<&str> for LockToken {
    fn from(token: &str) -> Self {
        LockToken::new(token)
    }
}

impl From<String> for LockToken {
    fn from(token: String) -> Self {
        LockToken(token)
    }
}

/// A held lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    pub folder_id: FileId,
    pub token: LockToken,
    pub acquired_at: DateTime<Utc>,
}

impl LockRecord {
    pub fn new(folder_id: FileId, token: LockToken, acquired_at: DateTime<Utc>) -> Self {
        Self {
            folder_id,
            token,
            acquired_at,
        }
    }

    /// Whether the lock is older than `timeout` at `now`.
    ///
    /// A record stamped in the future (clock skew) is never stale.
    pub fn is_stale(&self, timeout: Duration, now: DateTime<Utc>) -> bool {
        let Ok(timeout) = TimeDelta::from_std(timeout) else {
            return false;
        };
        now.signed_duration_since(self.acquired_at) > timeout
    }

    #[inline]
    pub fn is_held_by(&self, token: &LockToken) -> bool {
        self.token == *token
    }
}

/// Errors from lock operations.
#[derive(Error, Debug)]
pub enum LockError {
    #[error("Folder {folder_id} is already locked")]
    AlreadyLocked { folder_id: FileId },

    #[error("Folder {folder_id} is not locked")]
    NotLocked { folder_id: FileId },

    #[error("You are not allowed to remove the lock")]
    WrongHolder { folder_id: FileId },

    #[error("You are not allowed to edit the file, make sure to first lock it, and then send the right token")]
    NotAllowedToEdit { folder_id: FileId },

    #[error("Lock storage failure: {0}")]
    Storage(#[from] StorageError),
}

impl LockError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LockError::AlreadyLocked { .. } => ErrorKind::AlreadyLocked,
            LockError::NotLocked { .. } => ErrorKind::NotLocked,
            LockError::WrongHolder { .. } => ErrorKind::WrongHolder,
            LockError::NotAllowedToEdit { .. } => ErrorKind::NotAllowedToEdit,
            LockError::Storage(e) => e.kind(),
        }
    }

    /// A backend returned success without consulting the decision closure.
    fn skipped(folder_id: FileId) -> Self {
        LockError::Storage(StorageError::Corrupt {
            path: BlobPath::new(folder_id.to_string()),
            reason: "lock backend skipped the update".to_string(),
        })
    }
}

/// Grants, checks and releases per-folder locks.
#[derive(Debug, Clone)]
pub struct LockManager {
    backend: Arc<dyn LockBackend>,
}

impl LockManager {
    pub fn new(backend: Arc<dyn LockBackend>) -> Self {
        Self { backend }
    }

    /// Manager over a fresh process-local backend.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryLockBackend::new()))
    }

    /// Take the folder's lock for `token`.
    ///
    /// Succeeds iff no lock exists or the existing one is older than
    /// `timeout`. A live lock is never re-granted, not even to its own holder.
    #[instrument(level = "debug", skip_all, fields(folder_id = %folder_id))]
    pub fn acquire(
        &self,
        folder_id: FileId,
        token: &LockToken,
        timeout: Duration,
    ) -> Result<LockRecord, LockError> {
        let now = Utc::now();
        let mut outcome = None;

        self.backend.update(folder_id, &mut |current: Option<&LockRecord>| {
            if let Some(existing) = current {
                if !existing.is_stale(timeout, now) {
                    outcome = Some(Err(LockError::AlreadyLocked { folder_id }));
                    return LockUpdate::Keep;
                }
                warn!(acquired_at = %existing.acquired_at, "Reclaiming stale lock");
            }
            let record = LockRecord::new(folder_id, token.clone(), now);
            outcome = Some(Ok(record.clone()));
            LockUpdate::Put(record)
        })?;

        let record = outcome.ok_or_else(|| LockError::skipped(folder_id))??;
        info!("Lock acquired");
        Ok(record)
    }

    /// Release the folder's lock held by `token`.
    ///
    /// A mismatching token leaves the lock untouched.
    #[instrument(level = "debug", skip_all, fields(folder_id = %folder_id))]
    pub fn release(&self, folder_id: FileId, token: &LockToken) -> Result<(), LockError> {
        let mut outcome = None;

        self.backend.update(folder_id, &mut |current: Option<&LockRecord>| match current {
            None => {
                outcome = Some(Err(LockError::NotLocked { folder_id }));
                LockUpdate::Keep
            }
            Some(existing) if !existing.is_held_by(token) => {
                outcome = Some(Err(LockError::WrongHolder { folder_id }));
                LockUpdate::Keep
            }
            Some(_) => {
                outcome = Some(Ok(()));
                LockUpdate::Remove
            }
        })?;

        match outcome.ok_or_else(|| LockError::skipped(folder_id))? {
            Ok(()) => {
                info!("Lock released");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Lock release refused");
                Err(e)
            }
        }
    }

    /// Current lock of the folder, stale or not.
    pub fn is_locked(&self, folder_id: FileId) -> Result<Option<LockRecord>, LockError> {
        Ok(self.backend.get(folder_id)?)
    }

    /// Check that `token` currently holds the folder's lock.
    ///
    /// A stale lock that nobody has reclaimed yet still belongs to its holder.
    pub fn ensure_holder(&self, folder_id: FileId, token: &LockToken) -> Result<(), LockError> {
        match self.backend.get(folder_id)? {
            Some(record) if record.is_held_by(token) => {
                debug!(folder_id = %folder_id, "Lock holder verified");
                Ok(())
            }
            _ => {
                warn!(folder_id = %folder_id, "Write attempted without holding the lock");
                Err(LockError::NotAllowedToEdit { folder_id })
            }
        }
    }
}
