use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bbl_types::MediaKey;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::record::{BlobMeta, BlobRecord};
use crate::traits::BlobStore;

const PAYLOAD_EXT: &str = "bin";
const META_EXT: &str = "json";

/// Directory-backed blob store.
///
/// Each record is two files named after its key:
///
/// ```text
/// <root>/<key>.bin    payload bytes
/// <root>/<key>.json   BlobMeta sidecar
/// ```
///
/// Both files are written to a temporary file in `root` and renamed into
/// place, payload first, so a record is visible only once its sidecar
/// exists. Any I/O failure surfaces as `StorageUnavailable`.
#[derive(Debug)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open (or create) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn payload_path(&self, key: &MediaKey) -> PathBuf {
        self.root.join(format!("{key}.{PAYLOAD_EXT}"))
    }

    fn meta_path(&self, key: &MediaKey) -> PathBuf {
        self.root.join(format!("{key}.{META_EXT}"))
    }

    /// Keys reach the filesystem only after validation; anything else is
    /// treated as a key that cannot exist.
    fn usable(key: &MediaKey) -> bool {
        MediaKey::parse(key.as_str()).is_ok()
    }

    fn write_atomic(&self, target: &Path, bytes: &[u8]) -> StoreResult<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(target).map_err(|e| StoreError::from(e.error))?;
        Ok(())
    }

    fn read_meta(&self, key: &MediaKey) -> StoreResult<Option<BlobMeta>> {
        let bytes = match fs::read(self.meta_path(key)) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let meta = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Some(meta))
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, payload: Vec<u8>, media_kind: &str, display_name: &str) -> StoreResult<MediaKey> {
        let key = loop {
            let candidate = MediaKey::generate();
            if !self.meta_path(&candidate).exists() && !self.payload_path(&candidate).exists() {
                break candidate;
            }
        };
        let record = BlobRecord::new(key.clone(), payload, media_kind, display_name);
        let meta = serde_json::to_vec_pretty(&record.meta())
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        self.write_atomic(&self.payload_path(&key), &record.payload)?;
        self.write_atomic(&self.meta_path(&key), &meta)?;
        debug!(%key, size = record.size(), "stored blob");
        Ok(key)
    }

    fn get(&self, key: &MediaKey) -> StoreResult<Option<BlobRecord>> {
        if !Self::usable(key) {
            return Ok(None);
        }
        let Some(meta) = self.read_meta(key)? else {
            return Ok(None);
        };
        let payload = match fs::read(self.payload_path(key)) {
            Ok(p) => p,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::CorruptRecord {
                    key: key.clone(),
                    reason: "metadata present but payload missing".into(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        if payload.len() as u64 != meta.size {
            return Err(StoreError::CorruptRecord {
                key: key.clone(),
                reason: format!("expected {} bytes, found {}", meta.size, payload.len()),
            });
        }
        Ok(Some(BlobRecord::from_parts(meta, payload)))
    }

    fn delete(&self, key: &MediaKey) -> StoreResult<bool> {
        if !Self::usable(key) {
            return Ok(false);
        }
        // Sidecar first: once it is gone the record no longer exists.
        let existed = match fs::remove_file(self.meta_path(key)) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        match fs::remove_file(self.payload_path(key)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        if existed {
            debug!(%key, "deleted blob");
        }
        Ok(existed)
    }

    fn keys(&self) -> StoreResult<Vec<MediaKey>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().map(|e| e == META_EXT).unwrap_or(false) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if let Ok(key) = MediaKey::parse(stem) {
                        keys.push(key);
                    }
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}
