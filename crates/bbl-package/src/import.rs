use std::collections::HashMap;
use std::path::Path;

use bbl_archive::{ArchiveReader, DecodeOptions};
use bbl_store::BlobStore;
use bbl_types::{generate_id, unix_millis, ContentState, MediaKey, MediaRef, Subject};
use tracing::{info, warn};

use crate::config::PackageConfig;
use crate::error::{PackageError, PackageResult};
use crate::manifest::{Manifest, MANIFEST_ENTRY, SUBJECT_ENTRY};
use crate::package::SubjectPackage;

const FALLBACK_KIND: &str = "application/octet-stream";

/// Outcome of an import.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Catalog subject the topics were merged into.
    pub subject_id: String,
    pub topics_added: usize,
    pub teacher_topics_added: usize,
    /// Media payloads stored under new keys.
    pub media_imported: usize,
    /// Manifest paths with no matching archive entry.
    pub media_skipped: Vec<String>,
    /// `false` for metadata-only imports: media was not imported at all.
    pub media_supported: bool,
}

/// Old (package-local) media identity to new local key.
///
/// Built completely before any reference is rewritten.
#[derive(Debug, Default)]
struct KeyRemap {
    by_key: HashMap<MediaKey, MediaKey>,
    by_path: HashMap<String, MediaKey>,
}

impl KeyRemap {
    fn insert(&mut self, old: MediaKey, path: String, new: MediaKey) {
        self.by_key.insert(old, new.clone());
        self.by_path.insert(path, new);
    }

    fn resolve(&self, media: &MediaRef) -> Option<&MediaKey> {
        media
            .export_path
            .as_ref()
            .and_then(|p| self.by_path.get(p))
            .or_else(|| media.media_key.as_ref().and_then(|k| self.by_key.get(k)))
    }

    /// Rewrite a reference to its new local key, or drop it when the old
    /// identity was not remapped.
    fn rewrite(&self, media: Option<MediaRef>, topic_id: &str) -> Option<MediaRef> {
        let media = media?;
        match self.resolve(&media) {
            Some(new) => Some(media.with_local_key(new.clone())),
            None => {
                warn!(topic = topic_id, "media reference not in package, dropping it");
                None
            }
        }
    }

    fn len(&self) -> usize {
        self.by_key.len()
    }
}

/// Import a subject package archive.
///
/// Every media payload listed in the manifest is stored under a newly
/// generated key, every reference is rewritten to the new key (or dropped
/// if its payload was missing), the subject is merged into the catalog and
/// the teacher topics are appended. `state` is mutated but not persisted.
///
/// `subject.json` and `manifest.json` are parsed before the first store
/// write, so an [`PackageError::InvalidPackage`] leaves the store untouched.
pub fn import_package(
    state: &mut ContentState,
    store: &dyn BlobStore,
    bytes: &[u8],
    config: &PackageConfig,
) -> PackageResult<ImportReport> {
    check_size(bytes, config)?;
    let options = DecodeOptions {
        verify_checksums: config.verify_checksums,
    };
    let entries = ArchiveReader::with_options(bytes, options).into_map();

    let subject_json = entries
        .get(SUBJECT_ENTRY)
        .ok_or_else(|| PackageError::InvalidPackage(format!("missing {SUBJECT_ENTRY}")))?;
    let package: SubjectPackage = serde_json::from_slice(subject_json)
        .map_err(|e| PackageError::InvalidPackage(format!("{SUBJECT_ENTRY}: {e}")))?;
    let manifest: Manifest = match entries.get(MANIFEST_ENTRY) {
        Some(raw) => serde_json::from_slice(raw)
            .map_err(|e| PackageError::InvalidPackage(format!("{MANIFEST_ENTRY}: {e}")))?,
        None => Manifest::default(),
    };

    let kinds = media_kinds(&package);
    let mut remap = KeyRemap::default();
    let mut media_skipped = Vec::new();
    for (old, path) in manifest.media {
        let Some(data) = entries.get(&path) else {
            warn!(%old, path = %path, "manifest path missing from archive, skipping");
            media_skipped.push(path);
            continue;
        };
        let kind = kinds
            .get(path.as_str())
            .or_else(|| kinds.get(old.as_str()))
            .copied()
            .unwrap_or(FALLBACK_KIND);
        let name = path.rsplit('/').next().unwrap_or(&path).to_string();
        let new = store.put(data.clone(), kind, &name)?;
        remap.insert(old, path, new);
    }

    let report = merge(state, package, |media, topic| remap.rewrite(media, topic));
    let report = ImportReport {
        media_imported: remap.len(),
        media_skipped,
        media_supported: true,
        ..report
    };
    info!(
        subject = %report.subject_id,
        topics = report.topics_added,
        teacher_topics = report.teacher_topics_added,
        media = report.media_imported,
        skipped = report.media_skipped.len(),
        "imported subject package"
    );
    Ok(report)
}

/// Import a bare `subject.json`-shaped document.
///
/// This path carries no media payloads: every media reference is dropped
/// and the report has `media_supported == false`.
pub fn import_json(state: &mut ContentState, bytes: &[u8], config: &PackageConfig) -> PackageResult<ImportReport> {
    check_size(bytes, config)?;
    let package: SubjectPackage = serde_json::from_slice(bytes)
        .map_err(|e| PackageError::InvalidPackage(format!("json package: {e}")))?;
    let report = merge(state, package, |_, _| None);
    warn!(subject = %report.subject_id, "json package imported without media");
    Ok(ImportReport {
        media_supported: false,
        ..report
    })
}

/// Dispatch on the file name: `.tar` archives get the full import, `.json`
/// documents the metadata-only one. Unnamed input that carries the USTAR
/// magic is treated as an archive.
pub fn import_auto(
    state: &mut ContentState,
    store: &dyn BlobStore,
    file_name: &str,
    bytes: &[u8],
    config: &PackageConfig,
) -> PackageResult<ImportReport> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("tar") => import_package(state, store, bytes, config),
        Some("json") => import_json(state, bytes, config),
        _ if looks_like_archive(bytes) => import_package(state, store, bytes, config),
        _ => Err(PackageError::InvalidPackage(format!(
            "unsupported package type: {file_name}"
        ))),
    }
}

fn looks_like_archive(bytes: &[u8]) -> bool {
    bytes.get(257..262) == Some(&b"ustar"[..])
}

fn check_size(bytes: &[u8], config: &PackageConfig) -> PackageResult<()> {
    let size = bytes.len() as u64;
    if size > config.max_archive_bytes {
        return Err(PackageError::PackageTooLarge {
            size,
            max: config.max_archive_bytes,
        });
    }
    Ok(())
}

/// Media kind for each archive path and old key, taken from the first
/// reference to it.
fn media_kinds(package: &SubjectPackage) -> HashMap<&str, &str> {
    let refs = package
        .subject
        .topics
        .iter()
        .filter_map(|t| t.media.as_ref())
        .chain(package.teacher_topics.iter().filter_map(|t| t.media.as_ref()));
    let mut kinds = HashMap::new();
    for media in refs {
        if media.media_kind.is_empty() {
            continue;
        }
        let ids = media
            .export_path
            .as_deref()
            .into_iter()
            .chain(media.media_key.as_ref().map(MediaKey::as_str));
        for id in ids {
            kinds.entry(id).or_insert(media.media_kind.as_str());
        }
    }
    kinds
}

/// Rewrite every reference with `rewrite`, then merge into `state`.
fn merge<F>(state: &mut ContentState, package: SubjectPackage, rewrite: F) -> ImportReport
where
    F: Fn(Option<MediaRef>, &str) -> Option<MediaRef>,
{
    let SubjectPackage {
        subject,
        teacher_topics,
        ..
    } = package;

    let id = if subject.id.is_empty() {
        format!("import_{}", unix_millis())
    } else {
        subject.id
    };
    let title = if subject.title.is_empty() {
        id.clone()
    } else {
        subject.title
    };
    let topics = subject
        .topics
        .into_iter()
        .map(|mut t| {
            t.media = rewrite(t.media.take(), &t.id);
            t
        })
        .collect();
    let teacher: Vec<_> = teacher_topics
        .into_iter()
        .map(|mut t| {
            t.media = rewrite(t.media.take(), &t.id);
            if t.id.is_empty() {
                t.id = generate_id("t");
            }
            if t.subject.is_empty() {
                t.subject = id.clone();
            }
            t
        })
        .collect();

    let topics_added = state.merge_subject(Subject {
        id: id.clone(),
        title,
        description: subject.description,
        topics,
    });
    let teacher_topics_added = teacher.len();
    state.teacher_topics.extend(teacher);

    ImportReport {
        subject_id: id,
        topics_added,
        teacher_topics_added,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bbl_archive::ArchiveWriter;
    use bbl_store::InMemoryBlobStore;

    fn archive(entries: Vec<(&str, Vec<u8>)>) -> Vec<u8> {
        let mut w = ArchiveWriter::with_mtime(0);
        for (name, data) in entries {
            w.add(name, data).unwrap();
        }
        w.finish().unwrap()
    }

    const SUBJECT: &str = r#"{
        "subject": {"id": "sci", "title": "Science", "description": "d", "topics": [
            {"id": "t1", "title": "Cells", "lessonHtml": "<p>c</p>",
             "media": {"exportPath": "media/old1_clip.webm", "mediaKind": "audio/webm", "displayName": "clip.webm"}},
            {"id": "t2", "title": "Atoms", "lessonHtml": "<p>a</p>"}
        ]},
        "teacherTopics": [
            {"id": "tt1", "subject": "sci", "title": "Recap", "lessonHtml": "",
             "media": {"exportPath": "media/old1_clip.webm", "mediaKind": "audio", "displayName": "clip.webm"}}
        ],
        "created": "2026-01-01T00:00:00Z"
    }"#;
    const MANIFEST: &str = r#"{"media": {"old1": "media/old1_clip.webm"}}"#;

    #[test]
    fn imports_media_under_new_keys() {
        let store = InMemoryBlobStore::new();
        let mut state = ContentState::default();
        let bytes = archive(vec![
            (SUBJECT_ENTRY, SUBJECT.as_bytes().to_vec()),
            (MANIFEST_ENTRY, MANIFEST.as_bytes().to_vec()),
            ("media/old1_clip.webm", vec![9u8; 700]),
        ]);

        let report = import_package(&mut state, &store, &bytes, &PackageConfig::default()).unwrap();
        assert_eq!(report.subject_id, "sci");
        assert_eq!(report.topics_added, 2);
        assert_eq!(report.teacher_topics_added, 1);
        assert_eq!(report.media_imported, 1);
        assert!(report.media_supported);
        assert_eq!(store.len(), 1);

        let topic = &state.subject("sci").unwrap().topics[0];
        let media = topic.media.as_ref().unwrap();
        let key = media.media_key.clone().unwrap();
        assert_ne!(key.as_str(), "old1");
        assert!(media.export_path.is_none());

        let rec = store.get(&key).unwrap().unwrap();
        assert_eq!(rec.payload, vec![9u8; 700]);
        assert_eq!(rec.display_name, "old1_clip.webm");
        assert_eq!(rec.media_kind, "audio/webm");

        let tt_media = state.teacher_topics[0].media.as_ref().unwrap();
        assert_eq!(tt_media.media_key.as_ref(), Some(&key));
    }

    #[test]
    fn missing_subject_json_is_invalid_and_touches_nothing() {
        let store = InMemoryBlobStore::new();
        let mut state = ContentState::default();
        let bytes = archive(vec![
            (MANIFEST_ENTRY, MANIFEST.as_bytes().to_vec()),
            ("media/old1_clip.webm", b"abc".to_vec()),
        ]);
        let err = import_package(&mut state, &store, &bytes, &PackageConfig::default()).unwrap_err();
        assert!(matches!(err, PackageError::InvalidPackage(_)));
        assert!(store.is_empty());
        assert_eq!(state, ContentState::default());
    }

    #[test]
    fn unparsable_subject_json_touches_nothing() {
        let store = InMemoryBlobStore::new();
        let mut state = ContentState::default();
        let bytes = archive(vec![
            (SUBJECT_ENTRY, b"{not json".to_vec()),
            (MANIFEST_ENTRY, MANIFEST.as_bytes().to_vec()),
            ("media/old1_clip.webm", b"abc".to_vec()),
        ]);
        let err = import_package(&mut state, &store, &bytes, &PackageConfig::default()).unwrap_err();
        assert!(matches!(err, PackageError::InvalidPackage(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn manifest_path_missing_from_archive_is_skipped() {
        let store = InMemoryBlobStore::new();
        let mut state = ContentState::default();
        let bytes = archive(vec![
            (SUBJECT_ENTRY, SUBJECT.as_bytes().to_vec()),
            (MANIFEST_ENTRY, MANIFEST.as_bytes().to_vec()),
        ]);
        let report = import_package(&mut state, &store, &bytes, &PackageConfig::default()).unwrap();
        assert_eq!(report.media_imported, 0);
        assert_eq!(report.media_skipped, vec!["media/old1_clip.webm".to_string()]);
        assert!(state.subject("sci").unwrap().topics[0].media.is_none());
        assert!(state.teacher_topics[0].media.is_none());
    }

    #[test]
    fn legacy_key_references_are_remapped() {
        let subject = r#"{"subject": {"id": "s", "topics": [
            {"id": "a", "title": "A", "media": {"mediaKey": "old1", "type": "video", "name": "v"}}
        ]}}"#;
        let store = InMemoryBlobStore::new();
        let mut state = ContentState::default();
        let bytes = archive(vec![
            (SUBJECT_ENTRY, subject.as_bytes().to_vec()),
            (MANIFEST_ENTRY, MANIFEST.as_bytes().to_vec()),
            ("media/old1_clip.webm", b"vid".to_vec()),
        ]);
        import_package(&mut state, &store, &bytes, &PackageConfig::default()).unwrap();
        let subject = state.subject("s").unwrap();
        assert_eq!(subject.title, "s");
        let media = subject.topics[0].media.as_ref().unwrap();
        let rec = store.get(media.media_key.as_ref().unwrap()).unwrap().unwrap();
        assert_eq!(rec.payload, b"vid".to_vec());
        assert_eq!(rec.media_kind, "video");
    }

    #[test]
    fn subject_without_id_gets_generated_one() {
        let store = InMemoryBlobStore::new();
        let mut state = ContentState::default();
        let bytes = archive(vec![(SUBJECT_ENTRY, br#"{"subject": {"title": "Loose"}}"#.to_vec())]);
        let report = import_package(&mut state, &store, &bytes, &PackageConfig::default()).unwrap();
        assert!(report.subject_id.starts_with("import_"));
        assert_eq!(state.subject(&report.subject_id).unwrap().title, "Loose");
    }

    #[test]
    fn oversized_input_is_rejected() {
        let store = InMemoryBlobStore::new();
        let mut state = ContentState::default();
        let config = PackageConfig {
            max_archive_bytes: 1024,
            ..Default::default()
        };
        let bytes = archive(vec![(SUBJECT_ENTRY, SUBJECT.as_bytes().to_vec())]);
        let err = import_package(&mut state, &store, &bytes, &config).unwrap_err();
        assert!(matches!(err, PackageError::PackageTooLarge { .. }));
    }

    #[test]
    fn json_import_drops_media_and_says_so() {
        let mut state = ContentState::default();
        let report = import_json(&mut state, SUBJECT.as_bytes(), &PackageConfig::default()).unwrap();
        assert!(!report.media_supported);
        assert_eq!(report.media_imported, 0);
        assert_eq!(report.topics_added, 2);
        assert!(state.subject("sci").unwrap().topics.iter().all(|t| t.media.is_none()));
        assert!(state.teacher_topics[0].media.is_none());
    }

    #[test]
    fn json_import_requires_subject() {
        let mut state = ContentState::default();
        let err = import_json(&mut state, br#"{"teacherTopics": []}"#, &PackageConfig::default()).unwrap_err();
        assert!(matches!(err, PackageError::InvalidPackage(_)));
    }

    #[test]
    fn auto_dispatches_on_extension_and_magic() {
        let store = InMemoryBlobStore::new();
        let config = PackageConfig::default();
        let bytes = archive(vec![(SUBJECT_ENTRY, SUBJECT.as_bytes().to_vec())]);

        let mut state = ContentState::default();
        assert!(import_auto(&mut state, &store, "Pack.TAR", &bytes, &config).unwrap().media_supported);
        let mut state = ContentState::default();
        assert!(import_auto(&mut state, &store, "blob", &bytes, &config).unwrap().media_supported);
        let mut state = ContentState::default();
        let report = import_auto(&mut state, &store, "x.json", SUBJECT.as_bytes(), &config).unwrap();
        assert!(!report.media_supported);

        let err = import_auto(&mut state, &store, "x.zip", b"PK", &config).unwrap_err();
        assert!(matches!(err, PackageError::InvalidPackage(_)));
    }
}
