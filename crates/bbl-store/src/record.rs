use bbl_types::MediaKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata of a stored binary object, without its payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobMeta {
    pub key: MediaKey,
    pub media_kind: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub size: u64,
}

/// A stored binary object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobRecord {
    pub key: MediaKey,
    pub payload: Vec<u8>,
    pub media_kind: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

impl BlobRecord {
    pub fn new(key: MediaKey, payload: Vec<u8>, media_kind: &str, display_name: &str) -> Self {
        Self {
            key,
            payload,
            media_kind: media_kind.to_string(),
            display_name: display_name.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn size(&self) -> u64 {
        self.payload.len() as u64
    }

    pub fn meta(&self) -> BlobMeta {
        BlobMeta {
            key: self.key.clone(),
            media_kind: self.media_kind.clone(),
            display_name: self.display_name.clone(),
            created_at: self.created_at,
            size: self.size(),
        }
    }

    pub fn from_parts(meta: BlobMeta, payload: Vec<u8>) -> Self {
        Self {
            key: meta.key,
            payload,
            media_kind: meta.media_kind,
            display_name: meta.display_name,
            created_at: meta.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_roundtrips_through_parts() {
        let rec = BlobRecord::new(MediaKey::new_unchecked("m_1_aa"), vec![1, 2, 3], "audio/webm", "clip");
        let meta = rec.meta();
        assert_eq!(meta.size, 3);
        let back = BlobRecord::from_parts(meta, rec.payload.clone());
        assert_eq!(back, rec);
    }

    #[test]
    fn meta_json_is_camel_case() {
        let rec = BlobRecord::new(MediaKey::new_unchecked("m_1_aa"), vec![], "video", "v");
        let v = serde_json::to_value(rec.meta()).unwrap();
        assert_eq!(v["mediaKind"], "video");
        assert_eq!(v["displayName"], "v");
        assert!(v.get("createdAt").is_some());
    }
}
