use serde::{Deserialize, Serialize};

/// Configuration for package export and import.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageConfig {
    /// Archives larger than this are rejected before decoding.
    pub max_archive_bytes: u64,
    /// Stop decoding at the first header with a bad checksum.
    pub verify_checksums: bool,
    /// Archive directory that holds media payloads.
    pub media_dir: String,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            max_archive_bytes: 256 * 1024 * 1024,
            verify_checksums: false,
            media_dir: "media".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = PackageConfig::default();
        assert_eq!(c.max_archive_bytes, 256 * 1024 * 1024);
        assert!(!c.verify_checksums);
        assert_eq!(c.media_dir, "media");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c: PackageConfig = serde_json::from_str(r#"{"verify_checksums":true}"#).unwrap();
        assert!(c.verify_checksums);
        assert_eq!(c.media_dir, "media");
    }
}
