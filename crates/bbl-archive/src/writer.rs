use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::entry::ArchiveEntry;
use crate::error::{ArchiveError, ArchiveResult};
use crate::header::{padded_len, validate_name, Header, BLOCK_SIZE, MAX_ENTRY_SIZE};

/// Builds an archive from named payloads, in insertion order.
///
/// Names are validated as they are added, so a writer that accepted every
/// entry always finishes.
#[derive(Debug)]
pub struct ArchiveWriter {
    entries: Vec<ArchiveEntry>,
    names: HashSet<String>,
    mtime: u64,
}

impl ArchiveWriter {
    /// Create a writer stamping entries with the current time.
    pub fn new() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self::with_mtime(now)
    }

    /// Create a writer with a fixed modification time, for reproducible
    /// output.
    pub fn with_mtime(mtime: u64) -> Self {
        Self {
            entries: Vec::new(),
            names: HashSet::new(),
            mtime,
        }
    }

    /// Queue a payload under `name`.
    pub fn add(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> ArchiveResult<()> {
        self.add_entry(ArchiveEntry::new(name, data))
    }

    /// Queue an entry.
    pub fn add_entry(&mut self, entry: ArchiveEntry) -> ArchiveResult<()> {
        validate_name(&entry.name)?;
        check_size(&entry.name, entry.size())?;
        if !self.names.insert(entry.name.clone()) {
            return Err(ArchiveError::DuplicateName(entry.name));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Number of entries queued.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Size in bytes of the archive `finish` will produce.
    pub fn encoded_len(&self) -> usize {
        let body: u64 = self
            .entries
            .iter()
            .map(|e| BLOCK_SIZE as u64 + padded_len(e.size()))
            .sum();
        body as usize + 2 * BLOCK_SIZE
    }

    /// Encode all entries followed by the two-block end marker.
    pub fn finish(self) -> ArchiveResult<Vec<u8>> {
        let mut out = Vec::with_capacity(self.encoded_len());
        for entry in &self.entries {
            let header = Header::build(&entry.name, entry.size(), self.mtime)?;
            out.extend_from_slice(header.as_bytes());
            out.extend_from_slice(&entry.data);
            let pad = padded_len(entry.size()) as usize - entry.data.len();
            out.resize(out.len() + pad, 0);
        }
        out.resize(out.len() + 2 * BLOCK_SIZE, 0);
        tracing::debug!(entries = self.entries.len(), bytes = out.len(), "encoded archive");
        Ok(out)
    }
}

fn check_size(name: &str, size: u64) -> ArchiveResult<()> {
    if size > MAX_ENTRY_SIZE {
        return Err(ArchiveError::EntryTooLarge {
            name: name.to_string(),
            size,
        });
    }
    Ok(())
}

impl Default for ArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode entries into one archive byte stream.
///
/// Fails without producing output if any name is empty, contains NUL, is
/// longer than 100 bytes, or repeats an earlier name.
pub fn encode(entries: &[ArchiveEntry]) -> ArchiveResult<Vec<u8>> {
    let mut writer = ArchiveWriter::new();
    for entry in entries {
        writer.add_entry(entry.clone())?;
    }
    writer.finish()
}
