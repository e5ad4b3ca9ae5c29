//! Fixed 512-byte USTAR-style header block.
//!
//! ```text
//! offset  width  field
//!      0    100  name       ASCII/UTF-8, NUL-padded
//!    100      8  mode       octal "0"
//!    108      8  uid        octal "0"
//!    116      8  gid        octal "0"
//!    124     12  size       octal, NUL-terminated
//!    136     12  mtime      octal seconds since epoch
//!    148      8  checksum   octal byte sum, field counted as spaces
//!    156      1  typeflag   '0' (regular file)
//!    157    100  linkname   empty
//!    257      6  magic      "ustar\0"
//!    263      2  version    "00"
//!    265     32  uname      empty
//!    297     32  gname      empty
//! ```

use crate::error::{ArchiveError, ArchiveResult};

pub const BLOCK_SIZE: usize = 512;
pub const MAX_NAME_LEN: usize = 100;

pub const MAGIC: &[u8; 6] = b"ustar\0";
pub const VERSION: &[u8; 2] = b"00";
pub const TYPE_REGULAR: u8 = b'0';

const NAME: (usize, usize) = (0, 100);
const MODE: (usize, usize) = (100, 8);
const UID: (usize, usize) = (108, 8);
const GID: (usize, usize) = (116, 8);
const SIZE: (usize, usize) = (124, 12);
const MTIME: (usize, usize) = (136, 12);
const CHKSUM: (usize, usize) = (148, 8);
const TYPEFLAG: usize = 156;
const MAGIC_AT: usize = 257;
const VERSION_AT: usize = 263;

/// Largest payload the 11 octal digits of the size field can describe.
pub const MAX_ENTRY_SIZE: u64 = (1 << 33) - 1;

/// One header block.
#[derive(Clone, PartialEq, Eq)]
pub struct Header {
    block: [u8; BLOCK_SIZE],
}

impl Header {
    /// Build a regular-file header with its checksum filled in.
    pub fn build(name: &str, size: u64, mtime: u64) -> ArchiveResult<Self> {
        validate_name(name)?;
        if size > MAX_ENTRY_SIZE {
            return Err(ArchiveError::EntryTooLarge {
                name: name.to_string(),
                size,
            });
        }

        let mut block = [0u8; BLOCK_SIZE];
        block[..name.len()].copy_from_slice(name.as_bytes());
        write_octal(&mut block, MODE, 0, "mode")?;
        write_octal(&mut block, UID, 0, "uid")?;
        write_octal(&mut block, GID, 0, "gid")?;
        write_octal(&mut block, SIZE, size, "size")?;
        write_octal(&mut block, MTIME, mtime, "mtime")?;
        block[TYPEFLAG] = TYPE_REGULAR;
        block[MAGIC_AT..MAGIC_AT + MAGIC.len()].copy_from_slice(MAGIC);
        block[VERSION_AT..VERSION_AT + VERSION.len()].copy_from_slice(VERSION);

        let sum = compute_checksum(&block);
        write_octal(&mut block, CHKSUM, sum, "checksum")?;
        Ok(Self { block })
    }

    /// Wrap a raw block read from an archive.
    pub fn from_block(block: &[u8]) -> Option<Self> {
        let block: [u8; BLOCK_SIZE] = block.try_into().ok()?;
        Some(Self { block })
    }

    pub fn as_bytes(&self) -> &[u8; BLOCK_SIZE] {
        &self.block
    }

    /// Entry name, cut at the first NUL.
    pub fn name(&self) -> String {
        let field = &self.block[NAME.0..NAME.0 + NAME.1];
        String::from_utf8_lossy(until_nul(field)).into_owned()
    }

    /// Payload size. A missing or garbled field reads as 0.
    pub fn size(&self) -> u64 {
        parse_octal(&self.block[SIZE.0..SIZE.0 + SIZE.1]).unwrap_or(0)
    }

    pub fn mtime(&self) -> u64 {
        parse_octal(&self.block[MTIME.0..MTIME.0 + MTIME.1]).unwrap_or(0)
    }

    /// Stored checksum, if the field parses.
    pub fn stored_checksum(&self) -> Option<u64> {
        parse_octal(&self.block[CHKSUM.0..CHKSUM.0 + CHKSUM.1])
    }

    /// Returns `true` if the stored checksum matches the block contents.
    pub fn checksum_ok(&self) -> bool {
        self.stored_checksum() == Some(compute_checksum(&self.block))
    }
}

impl std::fmt::Debug for Header {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Header")
            .field("name", &self.name())
            .field("size", &self.size())
            .field("mtime", &self.mtime())
            .finish()
    }
}

/// Reject names the header cannot carry losslessly.
pub fn validate_name(name: &str) -> ArchiveResult<()> {
    if name.is_empty() {
        return Err(ArchiveError::EmptyName);
    }
    if name.as_bytes().contains(&0) {
        return Err(ArchiveError::InvalidName(name.to_string()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(ArchiveError::NameTooLong {
            name: name.to_string(),
            len: name.len(),
            max: MAX_NAME_LEN,
        });
    }
    Ok(())
}

/// Byte sum of the block with the checksum field counted as eight spaces.
pub fn compute_checksum(block: &[u8; BLOCK_SIZE]) -> u64 {
    block
        .iter()
        .enumerate()
        .map(|(i, &b)| {
            if (CHKSUM.0..CHKSUM.0 + CHKSUM.1).contains(&i) {
                u64::from(b' ')
            } else {
                u64::from(b)
            }
        })
        .sum()
}

pub fn is_zero_block(block: &[u8]) -> bool {
    block.iter().all(|&b| b == 0)
}

/// Payload length rounded up to the next block boundary.
pub fn padded_len(size: u64) -> u64 {
    size.div_ceil(BLOCK_SIZE as u64) * BLOCK_SIZE as u64
}

/// Write `value` as `width - 1` zero-padded octal digits plus a NUL.
fn write_octal(
    block: &mut [u8; BLOCK_SIZE],
    (offset, width): (usize, usize),
    value: u64,
    field: &'static str,
) -> ArchiveResult<()> {
    let digits = format!("{value:0w$o}", w = width - 1);
    if digits.len() > width - 1 {
        return Err(ArchiveError::FieldOverflow { field, value });
    }
    block[offset..offset + digits.len()].copy_from_slice(digits.as_bytes());
    block[offset + digits.len()] = 0;
    Ok(())
}

fn parse_octal(field: &[u8]) -> Option<u64> {
    let text = std::str::from_utf8(until_nul(field)).ok()?.trim();
    if text.is_empty() {
        return None;
    }
    u64::from_str_radix(text, 8).ok()
}

fn until_nul(field: &[u8]) -> &[u8] {
    match field.iter().position(|&b| b == 0) {
        Some(end) => &field[..end],
        None => field,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout_matches_fixed_offsets() {
        let h = Header::build("subject.json", 41, 0o1234).unwrap();
        let b = h.as_bytes();
        assert_eq!(&b[0..12], b"subject.json");
        assert_eq!(b[12], 0);
        assert_eq!(&b[100..108], b"0000000\0");
        assert_eq!(&b[108..116], b"0000000\0");
        assert_eq!(&b[116..124], b"0000000\0");
        assert_eq!(&b[124..136], b"00000000051\0");
        assert_eq!(&b[136..148], b"00000001234\0");
        assert_eq!(b[156], b'0');
        assert_eq!(&b[257..263], b"ustar\0");
        assert_eq!(&b[263..265], b"00");
        assert!(is_zero_block(&b[157..257]));
        assert!(is_zero_block(&b[265..329]));
    }

    #[test]
    fn checksum_counts_its_own_field_as_spaces() {
        let h = Header::build("a", 0, 0).unwrap();
        let mut spaced = *h.as_bytes();
        spaced[148..156].copy_from_slice(b"        ");
        let expected: u64 = spaced.iter().map(|&b| u64::from(b)).sum();
        assert_eq!(h.stored_checksum(), Some(expected));
        assert!(h.checksum_ok());
        assert_eq!(&h.as_bytes()[155..156], b"\0");
    }

    #[test]
    fn tampered_header_fails_checksum() {
        let h = Header::build("a.txt", 10, 0).unwrap();
        let mut raw = *h.as_bytes();
        raw[0] = b'b';
        let tampered = Header::from_block(&raw).unwrap();
        assert!(!tampered.checksum_ok());
    }

    #[test]
    fn name_of_exactly_100_bytes_is_accepted() {
        let name = "n".repeat(100);
        let h = Header::build(&name, 0, 0).unwrap();
        assert_eq!(h.name(), name);
    }

    #[test]
    fn name_over_100_bytes_is_rejected() {
        let name = "n".repeat(101);
        let err = Header::build(&name, 0, 0).unwrap_err();
        assert!(matches!(err, ArchiveError::NameTooLong { len: 101, .. }));
    }

    #[test]
    fn multibyte_name_is_measured_in_bytes() {
        let name = "é".repeat(51);
        assert!(matches!(
            validate_name(&name),
            Err(ArchiveError::NameTooLong { len: 102, .. })
        ));
    }

    #[test]
    fn empty_and_nul_names_are_rejected() {
        assert_eq!(validate_name(""), Err(ArchiveError::EmptyName));
        assert!(matches!(validate_name("a\0b"), Err(ArchiveError::InvalidName(_))));
    }

    #[test]
    fn oversized_entry_is_rejected() {
        let err = Header::build("big", MAX_ENTRY_SIZE + 1, 0).unwrap_err();
        assert!(matches!(err, ArchiveError::EntryTooLarge { .. }));
        assert!(Header::build("big", MAX_ENTRY_SIZE, 0).is_ok());
    }

    #[test]
    fn garbled_size_reads_as_zero() {
        let mut raw = *Header::build("x", 700, 0).unwrap().as_bytes();
        raw[124..136].copy_from_slice(b"zz9\0\0\0\0\0\0\0\0\0");
        assert_eq!(Header::from_block(&raw).unwrap().size(), 0);

        raw[124..136].fill(0);
        assert_eq!(Header::from_block(&raw).unwrap().size(), 0);
    }

    #[test]
    fn space_padded_size_is_parsed() {
        let mut raw = *Header::build("x", 0, 0).unwrap().as_bytes();
        raw[124..136].copy_from_slice(b"     1750 \0\0");
        assert_eq!(Header::from_block(&raw).unwrap().size(), 0o1750);
    }

    #[test]
    fn padded_len_rounds_to_blocks() {
        assert_eq!(padded_len(0), 0);
        assert_eq!(padded_len(1), 512);
        assert_eq!(padded_len(512), 512);
        assert_eq!(padded_len(1000), 1024);
    }
}
