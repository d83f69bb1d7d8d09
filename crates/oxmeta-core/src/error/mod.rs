//! Error types for the oxmeta-core crate.
//!
//! Each layer owns a `thiserror` enum (re-exported here). [`ErrorKind`] is
//! the shared classification every one of them maps onto, so a request
//! boundary can turn any failure into a status code without matching on
//! individual variants.

pub use crate::blob::StorageError;
pub use crate::lock::LockError;
pub use crate::metadata::MetadataError;
pub use crate::service::ServiceError;

/// Semantic category of a failure.
///
/// # Example
///
/// ```
/// use oxmeta_core::error::{ErrorKind, MetadataError};
///
/// let err = MetadataError::missing("Meta-data file missing");
/// assert_eq!(err.kind(), ErrorKind::MissingMetadata);
/// assert_eq!(err.kind().http_status(), 404);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Owner, folder, user or required blob could not be resolved.
    NotFound,
    /// Metadata (final or intermediate) already exists.
    AlreadyExists,
    /// Update or commit without prior staged or final content.
    MissingMetadata,
    /// Another client holds a live lock on the folder.
    AlreadyLocked,
    /// Release requested for a folder that is not locked.
    NotLocked,
    /// Release requested with a token that does not hold the lock.
    WrongHolder,
    /// Write attempted without holding the folder lock.
    NotAllowedToEdit,
    /// Unexpected failure of the underlying storage.
    StorageFailure,
}

impl ErrorKind {
    /// Human-readable name of this category.
    pub fn name(self) -> &'static str {
        match self {
            Self::NotFound => "NotFound",
            Self::AlreadyExists => "AlreadyExists",
            Self::MissingMetadata => "MissingMetadata",
            Self::AlreadyLocked => "AlreadyLocked",
            Self::NotLocked => "NotLocked",
            Self::WrongHolder => "WrongHolder",
            Self::NotAllowedToEdit => "NotAllowedToEdit",
            Self::StorageFailure => "StorageFailure",
        }
    }

    /// Suggested HTTP status for a transport layer.
    pub fn http_status(self) -> u16 {
        match self {
            Self::NotFound | Self::MissingMetadata => 404,
            Self::AlreadyExists | Self::NotLocked => 409,
            Self::AlreadyLocked | Self::WrongHolder | Self::NotAllowedToEdit => 403,
            Self::StorageFailure => 500,
        }
    }

    /// Whether retrying the same request later can succeed without any
    /// other client-side change.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::AlreadyLocked)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
