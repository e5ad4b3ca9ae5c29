use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use bbl_types::ContentState;
use tracing::debug;

use crate::error::{PackageError, PackageResult};

/// Load/save of the whole application document.
///
/// Mutating operations change a [`ContentState`] in memory; the host calls
/// `save` once afterwards.
pub trait StateStore: Send + Sync {
    /// Load the document, or an empty one if nothing was saved yet.
    fn load(&self) -> PackageResult<ContentState>;

    fn save(&self, state: &ContentState) -> PackageResult<()>;
}

/// Document persisted as one JSON file, replaced atomically on save.
#[derive(Debug)]
pub struct JsonFileStateStore {
    path: PathBuf,
}

impl JsonFileStateStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonFileStateStore {
    fn load(&self) -> PackageResult<ContentState> {
        let bytes = match fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ContentState::default()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes)
            .map_err(|e| PackageError::Persist(format!("{}: {e}", self.path.display())))
    }

    fn save(&self, state: &ContentState) -> PackageResult<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let json = serde_json::to_vec_pretty(state)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|e| PackageError::Persist(e.to_string()))?;
        debug!(path = %self.path.display(), bytes = json.len(), "saved state");
        Ok(())
    }
}

/// In-memory document store that counts saves.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    state: RwLock<Option<ContentState>>,
    saves: AtomicUsize,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing document.
    pub fn with_state(state: ContentState) -> Self {
        Self {
            state: RwLock::new(Some(state)),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// The last saved (or initial) document.
    pub fn snapshot(&self) -> Option<ContentState> {
        self.state.read().expect("lock poisoned").clone()
    }
}

impl StateStore for InMemoryStateStore {
    fn load(&self) -> PackageResult<ContentState> {
        Ok(self.snapshot().unwrap_or_default())
    }

    fn save(&self, state: &ContentState) -> PackageResult<()> {
        *self.state.write().expect("lock poisoned") = Some(state.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bbl_types::Subject;

    #[test]
    fn missing_file_loads_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStateStore::new(dir.path().join("state.json"));
        assert_eq!(store.load().unwrap(), ContentState::default());
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStateStore::new(dir.path().join("nested").join("state.json"));
        let mut state = ContentState::default();
        state.subjects.push(Subject::new("sci", "Science", ""));
        state.extra.insert("profile".into(), serde_json::json!({"name": "Ada"}));

        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), state);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, b"{oops").unwrap();
        let err = JsonFileStateStore::new(&path).load().unwrap_err();
        assert!(matches!(err, PackageError::Persist(_)));
    }

    #[test]
    fn in_memory_counts_saves() {
        let store = InMemoryStateStore::new();
        assert_eq!(store.load().unwrap(), ContentState::default());
        store.save(&ContentState::default()).unwrap();
        store.save(&ContentState::default()).unwrap();
        assert_eq!(store.save_count(), 2);
        assert!(store.snapshot().is_some());
    }
}
