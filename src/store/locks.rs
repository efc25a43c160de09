//! Per-path reader-writer locks
//!
//! One `RwLock` per physical file, created on first use and kept for the life
//! of the process. The map itself sits behind its own mutex.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub type FileLock = Arc<RwLock<()>>;

#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: Mutex<HashMap<PathBuf, FileLock>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock for `path`, creating it if this is the first access
    pub fn lock_for(&self, path: &Path) -> FileLock {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(path.to_path_buf()).or_default().clone()
    }

    /// Number of paths that have been locked so far
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// The guarded value is `()`, so a poisoned lock carries no broken state.
pub fn read(lock: &RwLock<()>) -> RwLockReadGuard<'_, ()> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub fn write(lock: &RwLock<()>) -> RwLockWriteGuard<'_, ()> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_path_same_lock() {
        let registry = LockRegistry::new();
        let a = registry.lock_for(Path::new("/data/entities/a.json"));
        let again = registry.lock_for(Path::new("/data/entities/a.json"));
        let b = registry.lock_for(Path::new("/data/entities/b.json"));

        assert!(Arc::ptr_eq(&a, &again));
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_readers_share_writer_excludes() {
        let registry = LockRegistry::new();
        let lock = registry.lock_for(Path::new("x"));

        let r1 = read(&lock);
        let r2 = read(&lock);
        assert!(lock.try_write().is_err());
        drop((r1, r2));

        let w = write(&lock);
        assert!(lock.try_read().is_err());
        drop(w);
        assert!(lock.try_read().is_ok());
    }
}
