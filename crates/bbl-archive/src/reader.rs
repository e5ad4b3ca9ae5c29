use std::collections::HashMap;

use tracing::warn;

use crate::entry::ArchiveEntry;
use crate::header::{is_zero_block, padded_len, Header, BLOCK_SIZE};

/// Options controlling how leniently an archive is read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Stop at the first header whose checksum does not match. Off by
    /// default: any compatible encoder's output is accepted.
    pub verify_checksums: bool,
}

/// Why decoding stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeEnd {
    /// An all-zero block marked the end of the archive.
    Terminator,
    /// The input ended exactly on a block boundary with no terminator.
    EndOfInput,
    /// The input ended inside a header or payload.
    Truncated,
    /// A header failed checksum verification.
    BadChecksum,
}

/// Decoded archive contents.
///
/// Decoding never fails: truncated input and unreadable headers end the
/// walk early and the entries read so far are kept.
#[derive(Clone, Debug)]
pub struct ArchiveReader {
    entries: Vec<ArchiveEntry>,
    end: DecodeEnd,
}

impl ArchiveReader {
    /// Decode with default (lenient) options.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::with_options(bytes, DecodeOptions::default())
    }

    pub fn with_options(bytes: &[u8], options: DecodeOptions) -> Self {
        let mut entries = Vec::new();
        let mut offset = 0usize;

        let end = loop {
            let Some(block) = bytes.get(offset..offset + BLOCK_SIZE) else {
                break if offset == bytes.len() {
                    DecodeEnd::EndOfInput
                } else {
                    DecodeEnd::Truncated
                };
            };
            if is_zero_block(block) {
                break DecodeEnd::Terminator;
            }
            let Some(header) = Header::from_block(block) else {
                break DecodeEnd::Truncated;
            };
            if options.verify_checksums && !header.checksum_ok() {
                warn!(offset, name = %header.name(), "archive header checksum mismatch");
                break DecodeEnd::BadChecksum;
            }

            let size = header.size();
            let start = offset + BLOCK_SIZE;
            let payload = usize::try_from(size)
                .ok()
                .and_then(|s| start.checked_add(s))
                .and_then(|stop| bytes.get(start..stop));
            let Some(payload) = payload else {
                warn!(offset, name = %header.name(), size, "archive truncated inside entry");
                break DecodeEnd::Truncated;
            };
            entries.push(ArchiveEntry::new(header.name(), payload.to_vec()));

            match usize::try_from(padded_len(size))
                .ok()
                .and_then(|p| start.checked_add(p))
            {
                Some(next) => offset = next,
                None => break DecodeEnd::Truncated,
            }
        };

        if end == DecodeEnd::Truncated {
            warn!(entries = entries.len(), "archive ended early; keeping entries read so far");
        }
        Self { entries, end }
    }

    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<ArchiveEntry> {
        self.entries
    }

    /// How the walk ended.
    pub fn end(&self) -> DecodeEnd {
        self.end
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Payload of the first entry with the given name.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.data.as_slice())
    }

    /// Name-to-payload map. If a foreign archive repeats a name, the last
    /// entry wins.
    pub fn into_map(self) -> HashMap<String, Vec<u8>> {
        self.entries.into_iter().map(|e| (e.name, e.data)).collect()
    }
}

/// Decode an archive byte stream into its entries, in order.
pub fn decode(bytes: &[u8]) -> Vec<ArchiveEntry> {
    ArchiveReader::from_bytes(bytes).into_entries()
}
