use std::collections::HashSet;

use bbl_archive::ArchiveWriter;
use bbl_store::BlobStore;
use bbl_types::{ContentState, MediaKey, MediaRef, Subject, TeacherTopic};
use chrono::Utc;
use tracing::{info, warn};

use crate::config::PackageConfig;
use crate::error::{PackageError, PackageResult};
use crate::manifest::{media_path, sanitize_segment, Manifest, MANIFEST_ENTRY, SUBJECT_ENTRY};
use crate::package::SubjectPackage;

/// A finished subject package.
#[derive(Clone, Debug)]
pub struct ExportedPackage {
    /// The archive byte stream.
    pub bytes: Vec<u8>,
    /// Suggested download name, `<subject>_package_<YYYY-MM-DD>.tar`.
    pub file_name: String,
    /// Media payloads included.
    pub media_count: usize,
    /// Referenced keys with no record in the store.
    pub skipped_media: Vec<MediaKey>,
}

/// Package a subject, its teacher topics and their media into an archive.
///
/// Runtime state is only read. Keys referenced by a topic but missing from
/// the store are skipped and the topic is exported without media; a store
/// failure aborts the whole export with [`PackageError::ExportFailed`].
pub fn export_subject(
    state: &ContentState,
    store: &dyn BlobStore,
    subject_id: &str,
    config: &PackageConfig,
) -> PackageResult<ExportedPackage> {
    let subject = state
        .subject(subject_id)
        .ok_or_else(|| PackageError::SubjectNotFound(subject_id.to_string()))?;
    let teacher: Vec<&TeacherTopic> = state.teacher_topics_for(subject_id).collect();

    let keys = referenced_keys(subject, &teacher);

    let mut manifest = Manifest::default();
    let mut media = Vec::with_capacity(keys.len());
    let mut skipped_media = Vec::new();
    for key in keys {
        match store.get(&key).map_err(PackageError::ExportFailed)? {
            Some(record) => {
                let path = media_path(&config.media_dir, &key, &record.display_name);
                manifest.media.insert(key, path.clone());
                media.push((path, record.payload));
            }
            None => {
                warn!(%key, subject = subject_id, "media record missing, exporting topic without it");
                skipped_media.push(key);
            }
        }
    }

    let package = SubjectPackage {
        subject: Subject {
            topics: subject
                .topics
                .iter()
                .map(|t| {
                    let mut copy = t.clone();
                    copy.media = export_ref(t.media.as_ref(), &manifest);
                    copy
                })
                .collect(),
            ..subject.clone()
        },
        teacher_topics: teacher
            .iter()
            .map(|t| TeacherTopic {
                media: export_ref(t.media.as_ref(), &manifest),
                ..(*t).clone()
            })
            .collect(),
        created: Utc::now(),
    };

    let mut writer = ArchiveWriter::new();
    writer.add(SUBJECT_ENTRY, serde_json::to_vec_pretty(&package)?)?;
    writer.add(MANIFEST_ENTRY, serde_json::to_vec_pretty(&manifest)?)?;
    let media_count = media.len();
    for (path, payload) in media {
        writer.add(path, payload)?;
    }
    let bytes = writer.finish()?;

    info!(
        subject = subject_id,
        media = media_count,
        skipped = skipped_media.len(),
        bytes = bytes.len(),
        "exported subject package"
    );
    Ok(ExportedPackage {
        bytes,
        file_name: format!(
            "{}_package_{}.tar",
            sanitize_segment(subject_id),
            Utc::now().format("%Y-%m-%d")
        ),
        media_count,
        skipped_media,
    })
}

/// Distinct live keys in first-reference order: catalog topics, then
/// teacher topics.
fn referenced_keys(subject: &Subject, teacher: &[&TeacherTopic]) -> Vec<MediaKey> {
    let mut seen = HashSet::new();
    subject
        .topics
        .iter()
        .filter_map(|t| t.media.as_ref())
        .chain(teacher.iter().filter_map(|t| t.media.as_ref()))
        .filter_map(|m| m.media_key.clone())
        .filter(|k| seen.insert(k.clone()))
        .collect()
}

/// In-transit form of a reference: the manifest path replaces the local key.
fn export_ref(media: Option<&MediaRef>, manifest: &Manifest) -> Option<MediaRef> {
    let media = media?;
    let path = manifest.path_of(media.media_key.as_ref()?)?;
    Some(MediaRef::exported(path, media.media_kind.clone(), media.display_name.clone()))
}
