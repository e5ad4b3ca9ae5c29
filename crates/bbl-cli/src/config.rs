use std::path::{Path, PathBuf};

use anyhow::Context;
use bbl_package::PackageConfig;
use serde::{Deserialize, Serialize};

/// `bbl` configuration, read from TOML.
///
/// ```toml
/// data_dir = "/var/lib/bluebird"
///
/// [package]
/// max_archive_bytes = 104857600
/// verify_checksums = true
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub data_dir: PathBuf,
    pub package: PackageConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./bluebird-data"),
            package: PackageConfig::default(),
        }
    }
}

impl CliConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn media_dir(&self) -> PathBuf {
        self.data_dir.join("media")
    }

    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join("state.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_file_gives_defaults() {
        let c = CliConfig::load(None).unwrap();
        assert_eq!(c, CliConfig::default());
        assert_eq!(c.media_dir(), PathBuf::from("./bluebird-data/media"));
        assert_eq!(c.state_path(), PathBuf::from("./bluebird-data/state.json"));
    }

    #[test]
    fn nested_package_table() {
        let c: CliConfig = toml::from_str(
            r#"
            data_dir = "/srv/bbl"
            [package]
            verify_checksums = true
            "#,
        )
        .unwrap();
        assert_eq!(c.data_dir, PathBuf::from("/srv/bbl"));
        assert!(c.package.verify_checksums);
        assert_eq!(c.package.media_dir, "media");
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CliConfig::load(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
