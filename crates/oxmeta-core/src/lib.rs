//! Staged metadata storage and per-folder locking for end-to-end encrypted
//! folders.
//!
//! Clients of an end-to-end encrypted folder keep the folder's encrypted key
//! material and file index in a single metadata blob that the server stores
//! but cannot read. This crate implements the server side of that protocol:
//!
//! - [`lock`] - exclusive per-folder locks with opaque tokens and stale-lock
//!   reclamation
//! - [`metadata`] - the two-phase staged write (`intermediate.meta.data` to
//!   `meta.data`)
//! - [`reconcile`] - resolution of `.e2e-to-save` / `.e2e-to-delete` tagged
//!   files when a lock is released
//! - [`service`] - the request-level facade enforcing "only the lock holder
//!   writes"
//!
//! Storage is abstracted behind [`blob::BlobStore`] (in-memory and local
//! filesystem backends) and ownership lookups behind [`owner::OwnerResolver`].
//! All operations are synchronous and every type is `Send + Sync`.

pub mod blob;
pub mod error;
pub mod lock;
pub mod metadata;
pub mod owner;
pub mod reconcile;
pub mod service;

pub use blob::{BlobPath, BlobStore, FsBlobStore, MemoryBlobStore};
pub use error::ErrorKind;
pub use lock::{FsLockBackend, LockManager, LockRecord, LockToken, MemoryLockBackend};
pub use metadata::{MetadataState, MetadataStore};
pub use owner::{FileId, OwnerResolver, StaticOwnerResolver, UserId};
pub use service::{FolderStatus, MetadataService, ServiceError};
