//! Staged metadata storage.
//!
//! Each end-to-end encrypted folder owns one metadata directory in the
//! app-data blob store, `/meta-data/<fileId>`, holding at most two blobs:
//!
//! - `meta.data` - the committed metadata every reader sees
//! - `intermediate.meta.data` - a staged write that has not been committed yet
//!
//! Writers never touch `meta.data` directly. New content is staged in the
//! intermediate blob and only promoted by [`MetadataStore::commit`], which
//! writes the final blob from bytes that are already completely stored. A
//! crash can therefore leave a stale final blob next to a staged one, which is
//! recoverable, but never a half-written final blob.
//!
//! # State machine
//!
//! ```text
//!            create_staged              commit
//!   Absent ────────────────► Staged ───────────► Committed
//!      ▲                       │  ▲                  │
//!      │      discard_staged   │  │   update_staged  │
//!      └───────────────────────┘  └──────────────────┘
//! ```
//!
//! Every public operation first verifies that the folder belongs to the user
//! and that the base directory exists. The store does not check locks; the
//! caller ([`MetadataService`](crate::service::MetadataService)) does.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::blob::{BlobPath, BlobStore, BlobStoreExt, Folder, StorageError};
use crate::error::ErrorKind;
use crate::owner::{FileId, OwnedNode, OwnerResolver, UserId};

/// Base directory of all metadata in the app-data store.
pub const METADATA_DIR: &str = "meta-data";
/// Name of the committed metadata blob.
pub const METADATA_FILE: &str = "meta.data";
/// Name of the staged metadata blob.
pub const INTERMEDIATE_FILE: &str = "intermediate.meta.data";

pub const MSG_METADATA_EXISTS: &str = "Meta-data file already exists";
pub const MSG_INTERMEDIATE_EXISTS: &str = "Intermediate meta-data file already exists";
pub const MSG_METADATA_MISSING: &str = "Meta-data file missing";
pub const MSG_INTERMEDIATE_MISSING: &str = "Intermediate meta-data file missing";
pub const MSG_METADATA_NOT_FOUND: &str = "Meta-data file not found";

/// Errors from metadata operations.
///
/// The `Display` output of the first three variants is exactly the reason
/// string; clients match on it.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("{reason}")]
    NotFound { reason: String },

    #[error("{reason}")]
    AlreadyExists { reason: String },

    #[error("{reason}")]
    MissingMetadata { reason: String },

    #[error("Storage failure: {0}")]
    Storage(#[from] StorageError),
}

impl MetadataError {
    pub fn not_found(reason: impl Into<String>) -> Self {
        MetadataError::NotFound {
            reason: reason.into(),
        }
    }

    pub fn already_exists(reason: impl Into<String>) -> Self {
        MetadataError::AlreadyExists {
            reason: reason.into(),
        }
    }

    pub fn missing(reason: impl Into<String>) -> Self {
        MetadataError::MissingMetadata {
            reason: reason.into(),
        }
    }

    /// The human-readable reason, as sent to clients.
    pub fn reason(&self) -> Cow<'_, str> {
        match self {
            MetadataError::NotFound { reason }
            | MetadataError::AlreadyExists { reason }
            | MetadataError::MissingMetadata { reason } => Cow::Borrowed(reason),
            MetadataError::Storage(e) => Cow::Owned(e.to_string()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            MetadataError::NotFound { .. } => ErrorKind::NotFound,
            MetadataError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            MetadataError::MissingMetadata { .. } => ErrorKind::MissingMetadata,
            MetadataError::Storage(e) => e.kind(),
        }
    }
}

/// Translate a storage "not found" into a protocol error; pass everything else through.
fn absent_as(err: StorageError, protocol_error: impl FnOnce() -> MetadataError) -> MetadataError {
    if err.is_not_found() {
        protocol_error()
    } else {
        MetadataError::Storage(err)
    }
}

/// Where a folder's metadata currently is in the staging protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetadataState {
    /// Neither blob exists.
    Absent,
    /// An intermediate blob exists. Takes precedence over `Committed` while
    /// an update is pending.
    Staged,
    /// Only the final blob exists.
    Committed,
}

impl fmt::Display for MetadataState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetadataState::Absent => "absent",
            MetadataState::Staged => "staged",
            MetadataState::Committed => "committed",
        };
        f.write_str(name)
    }
}

/// Staged-write metadata store over an app-data blob store.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    app_data: Arc<dyn BlobStore>,
    owners: Arc<dyn OwnerResolver>,
    base: BlobPath,
}

impl MetadataStore {
    pub fn new(app_data: Arc<dyn BlobStore>, owners: Arc<dyn OwnerResolver>) -> Self {
        Self::with_base_dir(app_data, owners, METADATA_DIR)
    }

    /// Create a store that keeps metadata under a custom base directory.
    pub fn with_base_dir(
        app_data: Arc<dyn BlobStore>,
        owners: Arc<dyn OwnerResolver>,
        base: impl Into<BlobPath>,
    ) -> Self {
        Self {
            app_data,
            owners,
            base: base.into(),
        }
    }

    /// Metadata directory of a folder: `<base>/<fileId>`.
    pub fn metadata_dir(&self, file_id: FileId) -> BlobPath {
        self.base.join(file_id.to_string())
    }

    #[inline]
    pub fn owners(&self) -> &Arc<dyn OwnerResolver> {
        &self.owners
    }

    /// Check that `file_id` resolves inside `user_id`'s tree.
    #[instrument(level = "trace", skip_all, fields(user = %user_id, file_id = %file_id))]
    pub fn verify_owner(&self, user_id: &UserId, file_id: FileId) -> Result<OwnedNode, MetadataError> {
        if !self.owners.user_exists(user_id)? {
            warn!("Unknown user");
            return Err(MetadataError::not_found(format!("No user-root for {user_id}")));
        }
        let mut nodes = self.owners.get_by_id(user_id, file_id)?;
        if nodes.is_empty() {
            warn!("Folder not in user's tree");
            return Err(MetadataError::not_found(format!(
                "No file for owner with ID {file_id}"
            )));
        }
        Ok(nodes.swap_remove(0))
    }

    /// Make sure the base metadata directory exists. Idempotent.
    pub fn verify_folder_structure(&self) -> Result<(), MetadataError> {
        let root = self.app_data.root_folder();
        if root.file_exists(self.base.as_str())? {
            return Ok(());
        }
        match self.app_data.new_folder(&self.base) {
            Ok(_) => {
                debug!(base = %self.base, "Created metadata base directory");
                Ok(())
            }
            // Another request created it first.
            Err(e) if e.is_already_exists() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn preflight(&self, user_id: &UserId, file_id: FileId) -> Result<OwnedNode, MetadataError> {
        let node = self.verify_owner(user_id, file_id)?;
        self.verify_folder_structure()?;
        Ok(node)
    }

    fn open_dir(&self, file_id: FileId) -> Result<Folder<'_, dyn BlobStore>, StorageError> {
        self.app_data.get_folder(&self.metadata_dir(file_id))
    }

    /// Read the committed metadata.
    #[instrument(level = "debug", skip_all, fields(user = %user_id, file_id = %file_id))]
    pub fn get(&self, user_id: &UserId, file_id: FileId) -> Result<Vec<u8>, MetadataError> {
        self.preflight(user_id, file_id)?;

        let not_found = || MetadataError::not_found(MSG_METADATA_NOT_FOUND);
        let folder = self.open_dir(file_id).map_err(|e| absent_as(e, not_found))?;
        let file = folder.get_file(METADATA_FILE).map_err(|e| absent_as(e, not_found))?;
        let content = file.content().map_err(|e| absent_as(e, not_found))?;
        debug!(content_len = content.len(), "Read metadata");
        Ok(content)
    }

    /// Stage metadata for a folder that has none yet.
    #[instrument(level = "debug", skip_all, fields(user = %user_id, file_id = %file_id, content_len = content.len()))]
    pub fn create_staged(
        &self,
        user_id: &UserId,
        file_id: FileId,
        content: &[u8],
    ) -> Result<(), MetadataError> {
        self.preflight(user_id, file_id)?;

        let dir = self.metadata_dir(file_id);
        let folder = match self.app_data.get_folder(&dir) {
            Ok(folder) => folder,
            Err(e) if e.is_not_found() => match self.app_data.new_folder(&dir) {
                Ok(folder) => {
                    debug!("Created metadata directory");
                    folder
                }
                Err(e) if e.is_already_exists() => self.app_data.get_folder(&dir)?,
                Err(e) => return Err(e.into()),
            },
            Err(e) => return Err(e.into()),
        };

        if folder.file_exists(METADATA_FILE)? {
            return Err(MetadataError::already_exists(MSG_METADATA_EXISTS));
        }
        if folder.file_exists(INTERMEDIATE_FILE)? {
            return Err(MetadataError::already_exists(MSG_INTERMEDIATE_EXISTS));
        }

        // Create-if-absent: a concurrent stager loses here rather than overwriting.
        folder
            .new_file(INTERMEDIATE_FILE, content)
            .map_err(|e| {
                if e.is_already_exists() {
                    MetadataError::already_exists(MSG_INTERMEDIATE_EXISTS)
                } else {
                    MetadataError::Storage(e)
                }
            })?;
        info!("Staged new metadata");
        Ok(())
    }

    /// Stage replacement metadata for a folder whose metadata is committed.
    ///
    /// The final blob is left untouched until [`commit`](Self::commit).
    #[instrument(level = "debug", skip_all, fields(user = %user_id, file_id = %file_id, content_len = content.len()))]
    pub fn update_staged(
        &self,
        user_id: &UserId,
        file_id: FileId,
        content: &[u8],
    ) -> Result<(), MetadataError> {
        self.preflight(user_id, file_id)?;

        let missing = || MetadataError::missing(MSG_METADATA_MISSING);
        let folder = self.open_dir(file_id).map_err(|e| absent_as(e, missing))?;
        if !folder.file_exists(METADATA_FILE)? {
            return Err(missing());
        }
        folder
            .put_file(INTERMEDIATE_FILE, content)
            .map_err(|e| absent_as(e, missing))?;
        info!("Staged metadata update");
        Ok(())
    }

    /// Promote the staged metadata to the final blob.
    ///
    /// The final blob is created or overwritten with the intermediate bytes,
    /// then the intermediate blob is removed.
    #[instrument(level = "debug", skip_all, fields(user = %user_id, file_id = %file_id))]
    pub fn commit(&self, user_id: &UserId, file_id: FileId) -> Result<(), MetadataError> {
        self.preflight(user_id, file_id)?;

        let missing = || MetadataError::missing(MSG_INTERMEDIATE_MISSING);
        let folder = self.open_dir(file_id).map_err(|e| absent_as(e, missing))?;
        if !folder.file_exists(INTERMEDIATE_FILE)? {
            return Err(missing());
        }

        let intermediate = folder
            .get_file(INTERMEDIATE_FILE)
            .map_err(|e| absent_as(e, missing))?;
        let content = intermediate.content().map_err(|e| absent_as(e, missing))?;
        folder.put_file(METADATA_FILE, &content)?;

        // The final blob is authoritative from here on; a leftover
        // intermediate would hold identical bytes.
        match intermediate.delete() {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }
        info!(content_len = content.len(), "Committed metadata");
        Ok(())
    }

    /// Drop any staged metadata. A no-op when nothing is staged.
    #[instrument(level = "debug", skip_all, fields(user = %user_id, file_id = %file_id))]
    pub fn discard_staged(&self, user_id: &UserId, file_id: FileId) -> Result<(), MetadataError> {
        self.preflight(user_id, file_id)?;

        let folder = match self.open_dir(file_id) {
            Ok(folder) => folder,
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        if !folder.file_exists(INTERMEDIATE_FILE)? {
            return Ok(());
        }
        match folder.get_file(INTERMEDIATE_FILE).and_then(|file| file.delete()) {
            Ok(()) => info!("Discarded staged metadata"),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// Remove the folder's whole metadata directory, if any.
    #[instrument(level = "debug", skip_all, fields(user = %user_id, file_id = %file_id))]
    pub fn delete(&self, user_id: &UserId, file_id: FileId) -> Result<(), MetadataError> {
        self.preflight(user_id, file_id)?;

        match self.open_dir(file_id).and_then(Folder::delete) {
            Ok(()) => info!("Deleted metadata"),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// Report the folder's position in the staging protocol.
    #[instrument(level = "trace", skip_all, fields(user = %user_id, file_id = %file_id))]
    pub fn state(&self, user_id: &UserId, file_id: FileId) -> Result<MetadataState, MetadataError> {
        self.preflight(user_id, file_id)?;

        let folder = match self.open_dir(file_id) {
            Ok(folder) => folder,
            Err(e) if e.is_not_found() => return Ok(MetadataState::Absent),
            Err(e) => return Err(e.into()),
        };
        if folder.file_exists(INTERMEDIATE_FILE)? {
            Ok(MetadataState::Staged)
        } else if folder.file_exists(METADATA_FILE)? {
            Ok(MetadataState::Committed)
        } else {
            Ok(MetadataState::Absent)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::MemoryBlobStore;
    use crate::owner::StaticOwnerResolver;

    const CONTENT: &[u8] = b"metadata-file-content";

    struct Fixture {
        blobs: Arc<MemoryBlobStore>,
        store: MetadataStore,
        user: UserId,
        id: FileId,
    }

    impl Fixture {
        fn new() -> Self {
            let blobs = Arc::new(MemoryBlobStore::new());
            let owners = Arc::new(StaticOwnerResolver::new().with_folder("userId", FileId::new(42), "userId/files/e2e"));
            let store = MetadataStore::new(blobs.clone(), owners);
            Self {
                blobs,
                store,
                user: UserId::new("userId"),
                id: FileId::new(42),
            }
        }

        /// Lay out the metadata directory directly in the blob store.
        fn seed(&self, folder: bool, final_blob: Option<&[u8]>, intermediate: Option<&[u8]>) {
            let dir = BlobPath::new("meta-data/42");
            if folder {
                self.blobs.create_folder(&dir).unwrap();
            }
            if let Some(content) = final_blob {
                self.blobs.write(&dir.join(METADATA_FILE), content).unwrap();
            }
            if let Some(content) = intermediate {
                self.blobs.write(&dir.join(INTERMEDIATE_FILE), content).unwrap();
            }
        }

        fn blob(&self, name: &str) -> Option<Vec<u8>> {
            self.blobs.read(&BlobPath::new("meta-data/42").join(name)).ok()
        }
    }

    #[test]
    fn test_verify_owner_unknown_user() {
        let f = Fixture::new();
        let err = f.store.verify_owner(&UserId::new("nobody"), f.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "No user-root for nobody");
    }

    #[test]
    fn test_verify_owner_unknown_file() {
        let f = Fixture::new();
        let err = f.store.verify_owner(&f.user, FileId::new(7)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "No file for owner with ID 7");
    }

    #[test]
    fn test_verify_owner_returns_node() {
        let f = Fixture::new();
        let node = f.store.verify_owner(&f.user, f.id).unwrap();
        assert_eq!(node.path.as_str(), "userId/files/e2e");
    }

    #[test]
    fn test_verify_folder_structure_is_idempotent() {
        let f = Fixture::new();
        f.store.verify_folder_structure().unwrap();
        f.store.verify_folder_structure().unwrap();
        assert_eq!(
            f.blobs.node_kind(&BlobPath::new(METADATA_DIR)).unwrap(),
            Some(crate::blob::NodeKind::Folder)
        );
    }

    #[test]
    fn test_every_operation_checks_owner_first() {
        let f = Fixture::new();
        f.seed(true, Some(CONTENT), Some(CONTENT));
        let stranger = UserId::new("mallory");

        assert_eq!(f.store.get(&stranger, f.id).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(f.store.create_staged(&stranger, f.id, b"x").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(f.store.update_staged(&stranger, f.id, b"x").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(f.store.commit(&stranger, f.id).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(f.store.discard_staged(&stranger, f.id).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(f.store.delete(&stranger, f.id).unwrap_err().kind(), ErrorKind::NotFound);

        // Nothing was touched.
        assert_eq!(f.blob(METADATA_FILE).as_deref(), Some(CONTENT));
        assert_eq!(f.blob(INTERMEDIATE_FILE).as_deref(), Some(CONTENT));
    }

    #[test]
    fn test_get_metadata() {
        let f = Fixture::new();
        f.seed(true, Some(CONTENT), None);
        assert_eq!(f.store.get(&f.user, f.id).unwrap(), CONTENT);
    }

    #[test]
    fn test_get_metadata_missing() {
        let f = Fixture::new();
        let err = f.store.get(&f.user, f.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), MSG_METADATA_NOT_FOUND);

        // A staged-only folder has nothing readable yet.
        f.seed(true, None, Some(CONTENT));
        assert_eq!(f.store.get(&f.user, f.id).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_create_staged() {
        // (folder exists, final exists, intermediate exists, expected error)
        let cases: [(bool, bool, bool, Option<&str>); 5] = [
            (false, false, false, None),
            (true, false, true, Some(MSG_INTERMEDIATE_EXISTS)),
            (true, false, false, None),
            (true, true, true, Some(MSG_METADATA_EXISTS)),
            (true, true, false, Some(MSG_METADATA_EXISTS)),
        ];

        for (folder, final_blob, intermediate, expected) in cases {
            let f = Fixture::new();
            f.seed(
                folder,
                final_blob.then_some(b"old-final".as_slice()),
                intermediate.then_some(b"old-intermediate".as_slice()),
            );
            let before = (f.blob(METADATA_FILE), f.blob(INTERMEDIATE_FILE));

            let result = f.store.create_staged(&f.user, f.id, CONTENT);
            match expected {
                None => {
                    result.unwrap();
                    assert_eq!(f.blob(INTERMEDIATE_FILE).as_deref(), Some(CONTENT));
                    assert_eq!(f.blob(METADATA_FILE), None);
                }
                Some(message) => {
                    let err = result.unwrap_err();
                    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
                    assert_eq!(err.to_string(), message);
                    assert_eq!((f.blob(METADATA_FILE), f.blob(INTERMEDIATE_FILE)), before);
                }
            }
        }
    }

    #[test]
    fn test_update_staged() {
        // (folder exists, final exists, intermediate exists, expect MissingMetadata)
        let cases = [
            (true, true, true, false),
            (true, true, false, false),
            (true, false, false, true),
            (false, false, false, true),
            (true, false, true, true),
        ];

        for (folder, final_blob, intermediate, expect_missing) in cases {
            let f = Fixture::new();
            f.seed(
                folder,
                final_blob.then_some(b"final".as_slice()),
                intermediate.then_some(b"old-intermediate".as_slice()),
            );

            let result = f.store.update_staged(&f.user, f.id, CONTENT);
            if expect_missing {
                let err = result.unwrap_err();
                assert_eq!(err.kind(), ErrorKind::MissingMetadata);
                assert_eq!(err.to_string(), MSG_METADATA_MISSING);
            } else {
                result.unwrap();
                assert_eq!(f.blob(INTERMEDIATE_FILE).as_deref(), Some(CONTENT));
                assert_eq!(f.blob(METADATA_FILE).as_deref(), Some(b"final".as_slice()));
            }
        }
    }

    #[test]
    fn test_commit() {
        // (folder exists, intermediate exists, final exists, expect MissingMetadata)
        let cases = [
            (false, false, false, true),
            (true, false, false, true),
            (true, true, true, false),
            (true, true, false, false),
        ];

        for (folder, intermediate, final_blob, expect_missing) in cases {
            let f = Fixture::new();
            f.seed(
                folder,
                final_blob.then_some(b"old-final".as_slice()),
                intermediate.then_some(b"intermediate-file-content".as_slice()),
            );

            let result = f.store.commit(&f.user, f.id);
            if expect_missing {
                let err = result.unwrap_err();
                assert_eq!(err.kind(), ErrorKind::MissingMetadata);
                assert_eq!(err.to_string(), MSG_INTERMEDIATE_MISSING);
            } else {
                result.unwrap();
                assert_eq!(
                    f.blob(METADATA_FILE).as_deref(),
                    Some(b"intermediate-file-content".as_slice())
                );
                assert_eq!(f.blob(INTERMEDIATE_FILE), None);
            }
        }
    }

    #[test]
    fn test_discard_staged() {
        for (folder, intermediate) in [(false, false), (true, false), (true, true)] {
            let f = Fixture::new();
            f.seed(folder, Some(b"final".as_slice()).filter(|_| folder), intermediate.then_some(CONTENT));

            f.store.discard_staged(&f.user, f.id).unwrap();
            f.store.discard_staged(&f.user, f.id).unwrap();
            assert_eq!(f.blob(INTERMEDIATE_FILE), None);
            if folder {
                assert_eq!(f.blob(METADATA_FILE).as_deref(), Some(b"final".as_slice()));
            }
        }
    }

    #[test]
    fn test_delete_metadata() {
        for folder in [true, false] {
            let f = Fixture::new();
            f.seed(folder, folder.then_some(CONTENT), None);

            f.store.delete(&f.user, f.id).unwrap();
            assert_eq!(f.blobs.node_kind(&f.store.metadata_dir(f.id)).unwrap(), None);
        }
    }

    #[test]
    fn test_state_transitions() {
        let f = Fixture::new();
        assert_eq!(f.store.state(&f.user, f.id).unwrap(), MetadataState::Absent);

        f.store.create_staged(&f.user, f.id, b"v1").unwrap();
        assert_eq!(f.store.state(&f.user, f.id).unwrap(), MetadataState::Staged);

        f.store.commit(&f.user, f.id).unwrap();
        assert_eq!(f.store.state(&f.user, f.id).unwrap(), MetadataState::Committed);

        f.store.update_staged(&f.user, f.id, b"v2").unwrap();
        assert_eq!(f.store.state(&f.user, f.id).unwrap(), MetadataState::Staged);
        assert_eq!(f.store.get(&f.user, f.id).unwrap(), b"v1");

        f.store.discard_staged(&f.user, f.id).unwrap();
        assert_eq!(f.store.state(&f.user, f.id).unwrap(), MetadataState::Committed);

        f.store.delete(&f.user, f.id).unwrap();
        assert_eq!(f.store.state(&f.user, f.id).unwrap(), MetadataState::Absent);
    }

    #[test]
    fn test_custom_base_dir() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let owners = Arc::new(StaticOwnerResolver::new().with_folder("u", FileId::new(1), "u/f"));
        let store = MetadataStore::with_base_dir(blobs.clone(), owners, "e2ee/meta");
        let user = UserId::new("u");

        store.create_staged(&user, FileId::new(1), b"x").unwrap();
        assert!(blobs.read(&BlobPath::new("e2ee/meta/1/intermediate.meta.data")).is_ok());
    }

    #[test]
    fn test_reason_is_protocol_string() {
        let err = MetadataError::already_exists(MSG_METADATA_EXISTS);
        assert_eq!(err.reason(), MSG_METADATA_EXISTS);
    }
}
