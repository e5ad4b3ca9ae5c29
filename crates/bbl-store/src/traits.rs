use bbl_types::MediaKey;

use crate::error::StoreResult;
use crate::record::BlobRecord;

/// Keyed store of binary objects.
///
/// All implementations must satisfy these invariants:
/// - `put` generates a key unique among the store's live keys.
/// - `get` returns `Ok(None)` for a key that does not exist.
/// - `delete` is idempotent and reports whether anything was removed.
/// - Records are never updated in place.
/// - Failure of the backing storage surfaces as
///   [`StoreError::StorageUnavailable`](crate::StoreError::StorageUnavailable).
pub trait BlobStore: Send + Sync {
    /// Store a payload and return its newly generated key.
    fn put(&self, payload: Vec<u8>, media_kind: &str, display_name: &str) -> StoreResult<MediaKey>;

    /// Read a record by key.
    fn get(&self, key: &MediaKey) -> StoreResult<Option<BlobRecord>>;

    /// Delete a record. Returns `true` if the record existed.
    fn delete(&self, key: &MediaKey) -> StoreResult<bool>;

    /// All live keys, sorted.
    fn keys(&self) -> StoreResult<Vec<MediaKey>>;

    /// Check whether a record exists.
    fn contains(&self, key: &MediaKey) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
