//! Keyed binary object storage for Bluebird Learn.
//!
//! Recorded and imported media payloads live here, each under a key that
//! the store generates at insertion time. Callers hold only the key; the
//! store owns the record.
//!
//! # Storage Backends
//!
//! All backends implement the [`BlobStore`] trait:
//!
//! - [`InMemoryBlobStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsBlobStore`] -- one directory, payload file plus JSON metadata sidecar
//!
//! # Design Rules
//!
//! 1. Keys are generated, never supplied by the caller.
//! 2. A key is never reissued while its record is live.
//! 3. There is no update-in-place: replacing a payload is delete + put.
//! 4. `get` and `delete` on an absent key are not errors.
//! 5. The store never interprets payloads.

pub mod error;
pub mod fs;
pub mod memory;
pub mod record;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsBlobStore;
pub use memory::InMemoryBlobStore;
pub use record::{BlobMeta, BlobRecord};
pub use traits::BlobStore;
