use std::collections::BTreeMap;

use bbl_archive::MAX_NAME_LEN;
use bbl_types::MediaKey;
use serde::{Deserialize, Serialize};

/// Archive entry holding the serialized [`SubjectPackage`](crate::SubjectPackage).
pub const SUBJECT_ENTRY: &str = "subject.json";
/// Archive entry holding the serialized [`Manifest`].
pub const MANIFEST_ENTRY: &str = "manifest.json";

/// Maps the exporting installation's media keys to archive paths.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub media: BTreeMap<MediaKey, String>,
}

impl Manifest {
    pub fn path_of(&self, key: &MediaKey) -> Option<&str> {
        self.media.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.media.len()
    }

    pub fn is_empty(&self) -> bool {
        self.media.is_empty()
    }
}

/// Make a display name safe to use as one path segment: separators, NUL
/// and control characters become `_`, and an empty result becomes `media`.
pub fn sanitize_segment(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();
    match cleaned.trim() {
        "" | "." | ".." => "media".to_string(),
        _ => cleaned,
    }
}

/// Archive path for a media payload: `<dir>/<key>_<displayName>`.
///
/// The display name part is shortened (on a character boundary) so the
/// path fits the archive's name field whenever the prefix does.
pub fn media_path(dir: &str, key: &MediaKey, display_name: &str) -> String {
    let prefix = format!("{dir}/{key}_");
    let mut name = sanitize_segment(display_name);
    let room = MAX_NAME_LEN.saturating_sub(prefix.len());
    if name.len() > room {
        let mut cut = room;
        while !name.is_char_boundary(cut) {
            cut -= 1;
        }
        name.truncate(cut);
    }
    prefix + &name
}
