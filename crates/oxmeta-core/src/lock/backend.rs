//! Lock record storage.

use std::fmt;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::LockRecord;
use crate::blob::StorageResult;
use crate::owner::FileId;

/// Decision of a [`LockBackend::update`] closure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockUpdate {
    /// Leave the current record (or its absence) as is.
    Keep,
    /// Store this record, replacing any current one.
    Put(LockRecord),
    /// Remove the current record.
    Remove,
}

/// Storage for lock records with atomic per-folder read-modify-write.
pub trait LockBackend: Send + Sync + fmt::Debug {
    /// Current record of a folder.
    fn get(&self, folder_id: FileId) -> StorageResult<Option<LockRecord>>;

    /// Atomically apply `f` to the folder's current record.
    ///
    /// No other update of the same folder may interleave between reading the
    /// record passed to `f` and applying its decision. When this returns
    /// `Ok`, `f` has been called exactly once.
    fn update(
        &self,
        folder_id: FileId,
        f: &mut dyn FnMut(Option<&LockRecord>) -> LockUpdate,
    ) -> StorageResult<()>;
}

/// Process-local lock records.
///
/// The entry API keeps the shard write lock for the duration of the closure,
/// which serializes updates of one folder.
#[derive(Debug, Default)]
pub struct MemoryLockBackend {
    records: DashMap<FileId, LockRecord>,
}

impl MemoryLockBackend {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Number of folders currently locked.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl LockBackend for MemoryLockBackend {
    fn get(&self, folder_id: FileId) -> StorageResult<Option<LockRecord>> {
        Ok(self.records.get(&folder_id).map(|r| r.value().clone()))
    }

    fn update(
        &self,
        folder_id: FileId,
        f: &mut dyn FnMut(Option<&LockRecord>) -> LockUpdate,
    ) -> StorageResult<()> {
        match self.records.entry(folder_id) {
            Entry::Occupied(mut entry) => match f(Some(entry.get())) {
                LockUpdate::Keep => {}
                LockUpdate::Put(record) => {
                    entry.insert(record);
                }
                LockUpdate::Remove => {
                    entry.remove();
                }
            },
            Entry::Vacant(entry) => {
                if let LockUpdate::Put(record) = f(None) {
                    entry.insert(record);
                }
            }
        }
        Ok(())
    }
}
