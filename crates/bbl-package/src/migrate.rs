//! One-time move of inline (`data:` URL) media into the blob store.
//!
//! Split in two so the decision is pure: [`plan_migration`] inspects
//! records and decodes payloads, [`MigrationPlan::apply`] performs the
//! store writes and rewrites the records. Migrated records no longer carry
//! inline data, so a second run finds nothing to do.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bbl_store::BlobStore;
use bbl_types::{MediaRef, TeacherTopic};
use tracing::{info, warn};

const DEFAULT_STORE_KIND: &str = "audio/webm";
const DEFAULT_REF_KIND: &str = "audio";
const DEFAULT_NAME: &str = "media";

/// A decoded inline payload waiting to be stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingInsert {
    /// Index into the teacher-topic list the plan was made from.
    pub index: usize,
    pub payload: Vec<u8>,
    /// Kind recorded on the stored object.
    pub store_kind: String,
    /// Kind kept on the rewritten reference.
    pub ref_kind: String,
    pub display_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MigrationFailure {
    pub index: usize,
    pub topic_id: String,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MigrationPlan {
    pub inserts: Vec<PendingInsert>,
    /// Inline payloads that could not be decoded; their records are left
    /// as they are.
    pub failures: Vec<MigrationFailure>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub migrated: usize,
    pub failed: usize,
}

/// Find every teacher topic still carrying inline media and decode it.
pub fn plan_migration(topics: &[TeacherTopic]) -> MigrationPlan {
    let mut plan = MigrationPlan::default();
    for (index, topic) in topics.iter().enumerate() {
        let Some(media) = topic.media.as_ref().filter(|m| m.is_legacy_inline()) else {
            continue;
        };
        let data = media.data.as_deref().unwrap_or_default();
        match decode_data_url(data) {
            Ok((mime, payload)) => {
                let store_kind = non_empty(&media.media_kind)
                    .or_else(|| non_empty(&mime))
                    .unwrap_or(DEFAULT_STORE_KIND)
                    .to_string();
                plan.inserts.push(PendingInsert {
                    index,
                    payload,
                    store_kind,
                    ref_kind: non_empty(&media.media_kind).unwrap_or(DEFAULT_REF_KIND).to_string(),
                    display_name: non_empty(&media.display_name).unwrap_or(DEFAULT_NAME).to_string(),
                });
            }
            Err(reason) => {
                warn!(topic = %topic.id, %reason, "cannot decode inline media");
                plan.failures.push(MigrationFailure {
                    index,
                    topic_id: topic.id.clone(),
                    reason,
                });
            }
        }
    }
    plan
}

impl MigrationPlan {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty()
    }

    /// Store each pending payload and point its record at the new key.
    ///
    /// `topics` must be the list the plan was made from. A failed store
    /// write leaves that record inline and counts it as failed; the rest of
    /// the plan still runs.
    pub fn apply(self, topics: &mut [TeacherTopic], store: &dyn BlobStore) -> MigrationReport {
        let mut report = MigrationReport {
            migrated: 0,
            failed: self.failures.len(),
        };
        for insert in self.inserts {
            let Some(topic) = topics.get_mut(insert.index) else {
                continue;
            };
            match store.put(insert.payload, &insert.store_kind, &insert.display_name) {
                Ok(key) => {
                    topic.media = Some(MediaRef::local(key, insert.ref_kind, insert.display_name));
                    report.migrated += 1;
                }
                Err(e) => {
                    warn!(topic = %topic.id, error = %e, "cannot store inline media, leaving it inline");
                    report.failed += 1;
                }
            }
        }
        if report.migrated > 0 || report.failed > 0 {
            info!(migrated = report.migrated, failed = report.failed, "migrated inline media");
        }
        report
    }
}

/// Plan and apply in one step.
pub fn migrate_legacy_media(topics: &mut [TeacherTopic], store: &dyn BlobStore) -> MigrationReport {
    plan_migration(topics).apply(topics, store)
}

/// Split `data:<mime>[;base64],<payload>` into its MIME type and bytes.
fn decode_data_url(url: &str) -> Result<(String, Vec<u8>), String> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| "not a data URL".to_string())?;
    let (meta, body) = rest
        .split_once(',')
        .ok_or_else(|| "data URL has no payload separator".to_string())?;
    let (mime, is_base64) = match meta.strip_suffix(";base64") {
        Some(mime) => (mime, true),
        None => (meta, false),
    };
    let mime = mime.split(';').next().unwrap_or_default().to_string();
    let payload = if is_base64 {
        STANDARD.decode(body.trim()).map_err(|e| e.to_string())?
    } else {
        body.as_bytes().to_vec()
    };
    Ok((mime, payload))
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}
