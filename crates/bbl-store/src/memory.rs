use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use bbl_types::MediaKey;

use crate::error::{StoreError, StoreResult};
use crate::record::BlobRecord;
use crate::traits::BlobStore;

#[derive(Default)]
struct Inner {
    records: HashMap<MediaKey, BlobRecord>,
    /// Every key ever handed out, including deleted ones.
    issued: HashSet<MediaKey>,
}

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. Records are held behind a `RwLock` and
/// cloned on read. The store remembers every key it has issued so a deleted
/// key is never handed out again. [`set_available`](Self::set_available)
/// switches the store off to exercise `StorageUnavailable` paths.
pub struct InMemoryBlobStore {
    inner: RwLock<Inner>,
    available: AtomicBool,
}

impl InMemoryBlobStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Make every subsequent operation fail (or succeed again).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.inner.read().expect("lock poisoned").records.len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.read().expect("lock poisoned").records.is_empty()
    }

    /// Total payload bytes across all records.
    pub fn total_bytes(&self) -> u64 {
        self.inner
            .read()
            .expect("lock poisoned")
            .records
            .values()
            .map(BlobRecord::size)
            .sum()
    }

    /// Remove all records. Issued keys stay retired.
    pub fn clear(&self) {
        self.inner.write().expect("lock poisoned").records.clear();
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::StorageUnavailable("in-memory store switched off".into()))
        }
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn put(&self, payload: Vec<u8>, media_kind: &str, display_name: &str) -> StoreResult<MediaKey> {
        self.check_available()?;
        let mut inner = self.inner.write().expect("lock poisoned");
        let key = loop {
            let candidate = MediaKey::generate();
            if !inner.issued.contains(&candidate) {
                break candidate;
            }
        };
        inner.issued.insert(key.clone());
        let record = BlobRecord::new(key.clone(), payload, media_kind, display_name);
        inner.records.insert(key.clone(), record);
        Ok(key)
    }

    fn get(&self, key: &MediaKey) -> StoreResult<Option<BlobRecord>> {
        self.check_available()?;
        let inner = self.inner.read().expect("lock poisoned");
        Ok(inner.records.get(key).cloned())
    }

    fn delete(&self, key: &MediaKey) -> StoreResult<bool> {
        self.check_available()?;
        let mut inner = self.inner.write().expect("lock poisoned");
        Ok(inner.records.remove(key).is_some())
    }

    fn keys(&self) -> StoreResult<Vec<MediaKey>> {
        self.check_available()?;
        let inner = self.inner.read().expect("lock poisoned");
        let mut keys: Vec<MediaKey> = inner.records.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("record_count", &self.len())
            .finish()
    }
}
