use serde::{Deserialize, Serialize};

use crate::key::MediaKey;

/// A topic's reference to its media payload.
///
/// At runtime a reference carries `media_key`, pointing into the local
/// binary object store. Inside an exported package it carries
/// `export_path` instead, an archive-relative path listed in the manifest.
/// Records written by older releases may still carry the payload inline as
/// a `data:` URL in `data`; the legacy migrator rewrites those.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_key: Option<MediaKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_path: Option<String>,
    /// MIME type or coarse kind (`audio`, `video`).
    #[serde(default, alias = "type")]
    pub media_kind: String,
    #[serde(default, alias = "name")]
    pub display_name: String,
    /// Deprecated inline payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl MediaRef {
    /// A reference to a record in the local store.
    pub fn local(key: MediaKey, media_kind: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            media_key: Some(key),
            media_kind: media_kind.into(),
            display_name: display_name.into(),
            ..Default::default()
        }
    }

    /// A reference to a payload inside a package archive.
    pub fn exported(path: impl Into<String>, media_kind: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            export_path: Some(path.into()),
            media_kind: media_kind.into(),
            display_name: display_name.into(),
            ..Default::default()
        }
    }

    /// Returns `true` if the payload is still stored inline and has not
    /// been moved into the binary object store.
    pub fn is_legacy_inline(&self) -> bool {
        self.data.is_some() && self.media_key.is_none()
    }

    /// Same reference re-pointed at a local key, with any in-transit or
    /// inline representation dropped.
    pub fn with_local_key(&self, key: MediaKey) -> Self {
        Self::local(key, self.media_kind.clone(), self.display_name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case_and_skips_absent_fields() {
        let r = MediaRef::local(MediaKey::new_unchecked("m_1_aa"), "audio/webm", "clip");
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["mediaKey"], "m_1_aa");
        assert_eq!(v["mediaKind"], "audio/webm");
        assert_eq!(v["displayName"], "clip");
        assert!(v.get("exportPath").is_none());
        assert!(v.get("data").is_none());
    }

    #[test]
    fn reads_legacy_field_names() {
        let json = r#"{"data":"data:audio/webm;base64,AAEC","type":"audio","name":"hello"}"#;
        let r: MediaRef = serde_json::from_str(json).unwrap();
        assert_eq!(r.media_kind, "audio");
        assert_eq!(r.display_name, "hello");
        assert!(r.is_legacy_inline());
    }

    #[test]
    fn with_local_key_drops_transit_fields() {
        let mut r = MediaRef::exported("media/k_a.webm", "video", "a.webm");
        r.data = Some("data:,".into());
        let local = r.with_local_key(MediaKey::new_unchecked("m_2_bb"));
        assert_eq!(local.media_key.as_ref().map(|k| k.as_str()), Some("m_2_bb"));
        assert!(local.export_path.is_none());
        assert!(local.data.is_none());
        assert_eq!(local.display_name, "a.webm");
    }
}
