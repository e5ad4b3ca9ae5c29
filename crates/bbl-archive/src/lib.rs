//! Archive codec for Bluebird Learn content packages.
//!
//! Encodes an ordered list of named payloads into one linear byte stream in
//! a tar-compatible (USTAR-style) layout, and decodes it back.
//!
//! # Format
//!
//! - Each entry: one 512-byte [`Header`] block, then the payload zero-padded
//!   to a multiple of 512 bytes (no padding for empty payloads).
//! - End of archive: two all-zero 512-byte blocks.
//!
//! # Architecture
//!
//! - **ArchiveWriter**: validates names up front and encodes in order
//! - **ArchiveReader**: tolerant sequential decode; never fails, stops at
//!   the terminator, at truncation, or (optionally) at a bad checksum
//!
//! The codec knows nothing about subjects, manifests or media.

pub mod entry;
pub mod error;
pub mod header;
pub mod reader;
pub mod writer;

pub use entry::ArchiveEntry;
pub use error::{ArchiveError, ArchiveResult};
pub use header::{Header, BLOCK_SIZE, MAX_NAME_LEN};
pub use reader::{decode, ArchiveReader, DecodeEnd, DecodeOptions};
pub use writer::{encode, ArchiveWriter};
