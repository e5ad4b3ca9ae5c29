use std::path::Path;

use bbl_store::BlobStore;
use bbl_types::{generate_id, ContentState, MediaKey, MediaRef, Subject, TeacherTopic};
use chrono::Utc;
use tracing::{info, warn};

use crate::config::PackageConfig;
use crate::error::{PackageError, PackageResult};
use crate::export::{export_subject, ExportedPackage};
use crate::import::{import_auto, import_json, import_package, ImportReport};
use crate::migrate::{migrate_legacy_media, MigrationReport};
use crate::persist::StateStore;

/// Content library: the loaded document plus the stores behind it.
///
/// Every mutating method changes the in-memory document and then saves it
/// exactly once. Blob writes always happen before that save, so a saved
/// document never references a key the store cannot resolve.
pub struct Library<S, P> {
    store: S,
    persist: P,
    state: ContentState,
    config: PackageConfig,
}

impl<S: BlobStore, P: StateStore> Library<S, P> {
    /// Load the document and run the legacy media migration once. Records
    /// that cannot be migrated stay inline and do not stop the open.
    pub fn open(store: S, persist: P, config: PackageConfig) -> PackageResult<Self> {
        let state = persist.load()?;
        let mut library = Self {
            store,
            persist,
            state,
            config,
        };
        let report = library.migrate();
        if report.migrated > 0 {
            library.save()?;
        }
        Ok(library)
    }

    pub fn state(&self) -> &ContentState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &PackageConfig {
        &self.config
    }

    /// Persist the current document.
    pub fn save(&self) -> PackageResult<()> {
        self.persist.save(&self.state)
    }

    fn migrate(&mut self) -> MigrationReport {
        migrate_legacy_media(&mut self.state.teacher_topics, &self.store)
    }

    // ---- Teacher topics ----

    /// Store a recording and add it as a teacher topic of `subject_id`.
    /// Returns the new topic's id.
    pub fn record_topic(
        &mut self,
        subject_id: &str,
        title: &str,
        media_kind: &str,
        payload: Vec<u8>,
    ) -> PackageResult<String> {
        let title = match title.trim() {
            "" => format!("Recording {}", Utc::now().format("%Y-%m-%d %H:%M:%S")),
            t => t.to_string(),
        };
        let key = self.store.put(payload, media_kind, &title)?;
        let id = generate_id("t");
        self.state.teacher_topics.push(TeacherTopic {
            id: id.clone(),
            subject: subject_id.to_string(),
            title: title.clone(),
            lesson_html: format!("<p>Recorded {media_kind}</p>"),
            media: Some(MediaRef::local(key, media_kind, title)),
            created: Utc::now(),
        });
        self.save()?;
        Ok(id)
    }

    /// Remove a teacher topic, optionally deleting its stored media too.
    ///
    /// Media still referenced by another record (a promoted catalog topic,
    /// or another teacher topic) is kept.
    pub fn remove_teacher_topic(&mut self, index: usize, delete_media: bool) -> PackageResult<TeacherTopic> {
        if index >= self.state.teacher_topics.len() {
            return Err(PackageError::TopicNotFound(index));
        }
        let removed = self.state.teacher_topics.remove(index);
        if delete_media {
            if let Some(key) = removed.media.as_ref().and_then(|m| m.media_key.as_ref()) {
                self.delete_unreferenced(key);
            }
        }
        self.save()?;
        Ok(removed)
    }

    fn delete_unreferenced(&self, key: &MediaKey) {
        let shared = self
            .state
            .media_refs()
            .any(|m| m.media_key.as_ref() == Some(key));
        if shared {
            info!(%key, "media still referenced, keeping it");
            return;
        }
        match self.store.delete(key) {
            Ok(true) => {}
            Ok(false) => warn!(%key, "media already gone"),
            Err(e) => warn!(%key, error = %e, "could not delete media"),
        }
    }

    /// Copy a teacher topic into the catalog, creating its subject if the
    /// catalog does not have it yet.
    pub fn promote_teacher_topic(&mut self, index: usize) -> PackageResult<()> {
        let teacher = self
            .state
            .teacher_topics
            .get(index)
            .ok_or(PackageError::TopicNotFound(index))?;
        let subject_id = teacher.subject.clone();
        let topic = teacher.to_topic();
        self.state.add_topic(&subject_id, topic, || {
            Subject::new(subject_id.clone(), subject_id.clone(), "Imported")
        });
        self.save()
    }

    // ---- Packages ----

    pub fn export_subject(&self, subject_id: &str) -> PackageResult<ExportedPackage> {
        export_subject(&self.state, &self.store, subject_id, &self.config)
    }

    /// Import an archive and save once.
    pub fn import_package(&mut self, bytes: &[u8]) -> PackageResult<ImportReport> {
        let report = import_package(&mut self.state, &self.store, bytes, &self.config)?;
        self.save()?;
        Ok(report)
    }

    /// Metadata-only import of a JSON package and save once.
    pub fn import_json(&mut self, bytes: &[u8]) -> PackageResult<ImportReport> {
        let report = import_json(&mut self.state, bytes, &self.config)?;
        self.save()?;
        Ok(report)
    }

    /// Import a package file, choosing the path by its extension.
    pub fn import_file(&mut self, path: &Path) -> PackageResult<ImportReport> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let report = import_auto(&mut self.state, &self.store, &name, &bytes, &self.config)?;
        self.save()?;
        info!(file = %path.display(), subject = %report.subject_id, "imported package file");
        Ok(report)
    }
}

impl<S, P> std::fmt::Debug for Library<S, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("subjects", &self.state.subjects.len())
            .field("teacher_topics", &self.state.teacher_topics.len())
            .finish()
    }
}
