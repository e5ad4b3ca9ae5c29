use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArchiveError {
    #[error("entry name is {len} bytes, the header field holds at most {max}: {name}")]
    NameTooLong { name: String, len: usize, max: usize },

    #[error("entry name is empty")]
    EmptyName,

    #[error("entry name contains a NUL byte: {0:?}")]
    InvalidName(String),

    #[error("duplicate entry name: {0}")]
    DuplicateName(String),

    #[error("entry {name} is {size} bytes, larger than the size field can hold")]
    EntryTooLarge { name: String, size: u64 },

    #[error("value {value} does not fit the {field} header field")]
    FieldOverflow { field: &'static str, value: u64 },
}

pub type ArchiveResult<T> = Result<T, ArchiveError>;
