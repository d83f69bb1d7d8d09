//! Integration tests for folder locking across threads and instances.

mod common;

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use common::{FixtureBuilder, all_fixtures};
use oxmeta_core::ErrorKind;
use oxmeta_core::lock::{
    DEFAULT_LOCK_TIMEOUT, FsLockBackend, LockBackend, LockManager, LockRecord, LockToken, LockUpdate,
    MemoryLockBackend,
};
use oxmeta_core::owner::FileId;
use tempfile::TempDir;

const THREADS: usize = 16;

fn race_for_lock(make_manager: impl Fn() -> LockManager) -> usize {
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            let locks = make_manager();
            thread::spawn(move || {
                let token = LockToken::generate();
                barrier.wait();
                locks.acquire(FileId::new(1), &token, DEFAULT_LOCK_TIMEOUT)
            })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        match handle.join().expect("thread panicked") {
            Ok(_) => winners += 1,
            Err(e) => assert_eq!(e.kind(), ErrorKind::AlreadyLocked),
        }
    }
    winners
}

#[test]
fn test_concurrent_acquire_has_one_winner_in_memory() {
    let locks = LockManager::in_memory();
    assert_eq!(race_for_lock(|| locks.clone()), 1);
}

#[test]
fn test_concurrent_acquire_has_one_winner_on_disk() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().to_path_buf();
    // Separate backend instances, as separate processes would have.
    let winners = race_for_lock(|| LockManager::new(Arc::new(FsLockBackend::open(&dir).unwrap())));
    assert_eq!(winners, 1);
}

#[test]
fn test_concurrent_acquire_on_different_folders() {
    let locks = LockManager::in_memory();
    let handles: Vec<_> = (0..THREADS as u64)
        .map(|id| {
            let locks = locks.clone();
            thread::spawn(move || locks.acquire(FileId::new(id), &LockToken::generate(), DEFAULT_LOCK_TIMEOUT))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().expect("independent folders must not contend");
    }
}

#[test]
fn test_stale_lock_takeover() {
    let folder = FileId::new(42);
    let backend = Arc::new(MemoryLockBackend::new());
    let abandoned = LockRecord::new(folder, LockToken::new("crashed-client"), Utc::now() - TimeDelta::minutes(5));
    backend
        .update(folder, &mut |_: Option<&LockRecord>| LockUpdate::Put(abandoned.clone()))
        .unwrap();

    let locks = LockManager::new(backend);
    let err = locks
        .acquire(folder, &LockToken::generate(), Duration::from_secs(600))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyLocked);

    let fresh = LockToken::generate();
    locks.acquire(folder, &fresh, Duration::from_secs(60)).unwrap();
    locks.ensure_holder(folder, &fresh).unwrap();
}

#[test]
fn test_status_reports_stale_lock() {
    let fx = FixtureBuilder::new().lock_timeout(Duration::ZERO).build();
    fx.service.lock(&fx.user, fx.folder, None).unwrap();
    thread::sleep(Duration::from_millis(5));

    let status = fx.service.status(&fx.user, fx.folder).unwrap();
    assert!(status.lock.expect("lock should be reported").stale);

    // The next client takes it over.
    fx.service.lock(&fx.user, fx.folder, None).unwrap();
}

#[test]
fn test_relock_by_holder_is_refused() {
    for (backend, fx) in all_fixtures() {
        let token = fx.service.lock(&fx.user, fx.folder, None).unwrap();
        let err = fx.service.lock(&fx.user, fx.folder, Some(token.clone())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyLocked, "{backend}");
        assert!(err.kind().is_retryable());
    }
}

#[test]
fn test_fs_lock_survives_new_manager() {
    let temp = TempDir::new().unwrap();
    let token = LockToken::generate();
    {
        let locks = LockManager::new(Arc::new(FsLockBackend::open(temp.path()).unwrap()));
        locks.acquire(FileId::new(5), &token, DEFAULT_LOCK_TIMEOUT).unwrap();
    }

    let locks = LockManager::new(Arc::new(FsLockBackend::open(temp.path()).unwrap()));
    let record = locks.is_locked(FileId::new(5)).unwrap().expect("lock persisted");
    assert!(record.is_held_by(&token));
    locks.release(FileId::new(5), &token).unwrap();
    assert!(locks.is_locked(FileId::new(5)).unwrap().is_none());
}
