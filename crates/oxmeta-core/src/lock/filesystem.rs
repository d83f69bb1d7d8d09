//! Lock records on the local filesystem.
//!
//! Layout under the lock directory:
//!
//! ```text
//! <dir>/<folderId>.lock    JSON-encoded LockRecord, present while locked
//! <dir>/<folderId>.guard   empty file carrying the advisory lock
//! ```
//!
//! Updates take an exclusive `flock` on the guard file, so processes sharing
//! the directory serialize their read-modify-write cycles. Records are
//! replaced through a temp file and rename, so [`LockBackend::get`] can read
//! without taking the guard. Guard files are never removed; deleting one while
//! another process holds it would split the lock.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{trace, warn};

use super::{LockBackend, LockRecord, LockUpdate};
use crate::blob::{BlobPath, StorageError, StorageResult};
use crate::owner::FileId;

const RECORD_EXTENSION: &str = "lock";
const GUARD_EXTENSION: &str = "guard";

/// Lock records stored as files in a local directory.
#[derive(Debug, Clone)]
pub struct FsLockBackend {
    dir: PathBuf,
}

impl FsLockBackend {
    /// Open a backend in `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StorageError::Io {
            source: e,
            path: BlobPath::root(),
        })?;
        Ok(Self { dir })
    }

    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, folder_id: FileId) -> PathBuf {
        self.dir.join(format!("{folder_id}.{RECORD_EXTENSION}"))
    }

    fn guard_path(&self, folder_id: FileId) -> PathBuf {
        self.dir.join(format!("{folder_id}.{GUARD_EXTENSION}"))
    }

    /// Logical path used in error reports.
    fn blob_path(folder_id: FileId) -> BlobPath {
        BlobPath::new(format!("{folder_id}.{RECORD_EXTENSION}"))
    }

    fn io_error(source: io::Error, folder_id: FileId) -> StorageError {
        StorageError::Io {
            source,
            path: Self::blob_path(folder_id),
        }
    }

    fn read_record(&self, folder_id: FileId) -> StorageResult<Option<LockRecord>> {
        let bytes = match fs::read(self.record_path(folder_id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::io_error(e, folder_id)),
        };
        let record: LockRecord = serde_json::from_slice(&bytes).map_err(|e| StorageError::Corrupt {
            path: Self::blob_path(folder_id),
            reason: e.to_string(),
        })?;
        if record.folder_id != folder_id {
            return Err(StorageError::Corrupt {
                path: Self::blob_path(folder_id),
                reason: format!("record belongs to folder {}", record.folder_id),
            });
        }
        Ok(Some(record))
    }

    fn write_record(&self, record: &LockRecord) -> StorageResult<()> {
        let folder_id = record.folder_id;
        let json = serde_json::to_vec_pretty(record).map_err(|e| StorageError::Corrupt {
            path: Self::blob_path(folder_id),
            reason: e.to_string(),
        })?;

        let mut temp_file = tempfile::Builder::new()
            .prefix(".lock-tmp-")
            .tempfile_in(&self.dir)
            .map_err(|e| Self::io_error(e, folder_id))?;
        temp_file
            .write_all(&json)
            .and_then(|()| temp_file.as_file().sync_all())
            .map_err(|e| Self::io_error(e, folder_id))?;
        temp_file
            .persist(self.record_path(folder_id))
            .map_err(|e| Self::io_error(e.error, folder_id))?;
        Ok(())
    }

    fn remove_record(&self, folder_id: FileId) -> StorageResult<()> {
        match fs::remove_file(self.record_path(folder_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error(e, folder_id)),
        }
    }
}

impl LockBackend for FsLockBackend {
    fn get(&self, folder_id: FileId) -> StorageResult<Option<LockRecord>> {
        self.read_record(folder_id)
    }

    fn update(
        &self,
        folder_id: FileId,
        f: &mut dyn FnMut(Option<&LockRecord>) -> LockUpdate,
    ) -> StorageResult<()> {
        let guard = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(self.guard_path(folder_id))
            .map_err(|e| Self::io_error(e, folder_id))?;
        fs2::FileExt::lock_exclusive(&guard).map_err(|e| Self::io_error(e, folder_id))?;
        trace!(folder_id = %folder_id, "Guard acquired");

        let result = self.read_record(folder_id).and_then(|current| match f(current.as_ref()) {
            LockUpdate::Keep => Ok(()),
            LockUpdate::Put(record) => self.write_record(&record),
            LockUpdate::Remove => self.remove_record(folder_id),
        });

        // Closing the file releases the lock as well; an explicit unlock
        // just makes it prompt.
        if let Err(e) = fs2::FileExt::unlock(&guard) {
            warn!(folder_id = %folder_id, error = %e, "Failed to release guard");
        }
        result
    }
}
