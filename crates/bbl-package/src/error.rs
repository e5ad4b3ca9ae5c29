use bbl_archive::ArchiveError;
use bbl_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackageError {
    /// The input is not a usable subject package. Raised before any store
    /// mutation.
    #[error("invalid package: {0}")]
    InvalidPackage(String),

    /// A media fetch failed while exporting; no archive was produced.
    #[error("export failed: {0}")]
    ExportFailed(#[source] StoreError),

    #[error("subject not found: {0}")]
    SubjectNotFound(String),

    #[error("teacher topic index {0} out of range")]
    TopicNotFound(usize),

    #[error("package is {size} bytes, limit is {max}")]
    PackageTooLarge { size: u64, max: u64 },

    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("state persistence failed: {0}")]
    Persist(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PackageResult<T> = Result<T, PackageError>;
