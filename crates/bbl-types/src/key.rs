use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Installation-local key of a binary object.
///
/// Keys are generated by the store at insertion time as
/// `m_<unix-millis>_<random hex>`. A key is an opaque back-reference: it is
/// never interpreted as a path and is not portable between installations.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaKey(String);

impl MediaKey {
    /// Generate a fresh key from the wall clock and a random suffix.
    pub fn generate() -> Self {
        Self(format!("m_{}_{}", unix_millis(), random_suffix()))
    }

    /// Wrap an existing key, rejecting values that could escape a store
    /// directory or that are empty.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let valid = !s.is_empty()
            && s != "."
            && s != ".."
            && !s.chars().any(|c| c == '/' || c == '\\' || c.is_control());
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(TypeError::InvalidMediaKey(s.to_string()))
        }
    }

    /// Wrap a key without validation. Used for keys read back from records
    /// that were produced by another installation.
    pub fn new_unchecked(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for MediaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MediaKey({})", self.0)
    }
}

impl fmt::Display for MediaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MediaKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Milliseconds since the UNIX epoch (0 if the clock is before it).
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Generate a record id of the form `<prefix>_<unix-millis>_<random hex>`.
pub fn generate_id(prefix: &str) -> String {
    format!("{prefix}_{}_{}", unix_millis(), random_suffix())
}

fn random_suffix() -> String {
    let bytes: [u8; 4] = rand::thread_rng().gen();
    hex::encode(bytes)
}
