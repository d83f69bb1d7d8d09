use std::sync::Arc;

use oxmeta_core::blob::{BlobPath, BlobStore, FsBlobStore, MemoryBlobStore};
use oxmeta_core::lock::{FsLockBackend, LockBackend, LockManager, MemoryLockBackend};
use oxmeta_core::metadata::MetadataStore;
use oxmeta_core::owner::{FileId, StaticOwnerResolver, UserId};
use oxmeta_core::service::MetadataService;
use tempfile::TempDir;

pub const USER: &str = "alice";
pub const FOLDER_ID: FileId = FileId::new(42);
pub const FOLDER_PATH: &str = "alice/files/secret";

/// Install a test subscriber once so `RUST_LOG` works in integration tests.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Fully wired service plus handles to its stores.
pub struct Fixture {
    pub service: MetadataService,
    pub app_data: Arc<dyn BlobStore>,
    pub files: Arc<dyn BlobStore>,
    pub user: UserId,
    pub folder: FileId,
    // Keeps on-disk backends alive for the fixture's lifetime.
    #[allow(dead_code)]
    pub temp: Option<TempDir>,
}

#[allow(dead_code)]
impl Fixture {
    pub fn folder_path(&self) -> BlobPath {
        BlobPath::new(FOLDER_PATH)
    }

    /// Put a file directly into the user's folder.
    pub fn put_user_file(&self, name: &str, content: &[u8]) {
        self.files.write(&self.folder_path().join(name), content).unwrap();
    }

    pub fn user_files(&self) -> Vec<String> {
        self.files
            .list(&self.folder_path())
            .unwrap()
            .into_iter()
            .map(|n| n.name)
            .collect()
    }
}

/// Builder for test fixtures over memory or filesystem backends.
pub struct FixtureBuilder {
    on_disk: bool,
    lock_timeout: Option<std::time::Duration>,
}

#[allow(dead_code)]
impl FixtureBuilder {
    pub fn new() -> Self {
        Self {
            on_disk: false,
            lock_timeout: None,
        }
    }

    pub fn on_disk(mut self) -> Self {
        self.on_disk = true;
        self
    }

    pub fn lock_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Fixture {
        let (app_data, files, lock_backend, temp): (Arc<dyn BlobStore>, Arc<dyn BlobStore>, Arc<dyn LockBackend>, _) =
            if self.on_disk {
                let temp = TempDir::new().unwrap();
                (
                    Arc::new(FsBlobStore::open(temp.path().join("appdata")).unwrap()),
                    Arc::new(FsBlobStore::open(temp.path().join("files")).unwrap()),
                    Arc::new(FsLockBackend::open(temp.path().join("locks")).unwrap()),
                    Some(temp),
                )
            } else {
                (
                    Arc::new(MemoryBlobStore::new()),
                    Arc::new(MemoryBlobStore::new()),
                    Arc::new(MemoryLockBackend::new()),
                    None,
                )
            };

        files.create_folder(&BlobPath::new(FOLDER_PATH)).unwrap();
        let owners = Arc::new(StaticOwnerResolver::new().with_folder(USER, FOLDER_ID, FOLDER_PATH));
        let metadata = MetadataStore::new(app_data.clone(), owners);
        let mut service = MetadataService::new(metadata, LockManager::new(lock_backend), files.clone());
        if let Some(timeout) = self.lock_timeout {
            service = service.with_lock_timeout(timeout);
        }

        Fixture {
            service,
            app_data,
            files,
            user: UserId::new(USER),
            folder: FOLDER_ID,
            temp,
        }
    }
}

/// Both backend flavours, for tests that must hold on each.
#[allow(dead_code)]
pub fn all_fixtures() -> Vec<(&'static str, Fixture)> {
    vec![
        ("memory", FixtureBuilder::new().build()),
        ("filesystem", FixtureBuilder::new().on_disk().build()),
    ]
}
