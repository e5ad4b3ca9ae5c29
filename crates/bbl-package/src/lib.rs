//! Subject packages for Bluebird Learn.
//!
//! Moves a subject, its teacher-recorded topics and their media between
//! installations as one archive, and keeps the local document and blob
//! store consistent while doing so.
//!
//! # Architecture
//!
//! - [`export_subject`]: collect media keys, fetch payloads, build the
//!   [`Manifest`], rewrite references to archive paths, encode
//! - [`import_package`]: decode, store payloads under new keys, remap every
//!   reference, merge into the catalog
//! - [`plan_migration`]: pure scan for legacy inline media; the resulting
//!   [`MigrationPlan`] is applied against a store
//! - [`Library`]: the explicit state object tying a [`BlobStore`] and a
//!   [`StateStore`] together; saves once per mutating call
//!
//! [`BlobStore`]: bbl_store::BlobStore

pub mod config;
pub mod error;
pub mod export;
pub mod import;
pub mod library;
pub mod manifest;
pub mod migrate;
pub mod package;
pub mod persist;

pub use config::PackageConfig;
pub use error::{PackageError, PackageResult};
pub use export::{export_subject, ExportedPackage};
pub use import::{import_auto, import_json, import_package, ImportReport};
pub use library::Library;
pub use manifest::{media_path, sanitize_segment, Manifest, MANIFEST_ENTRY, SUBJECT_ENTRY};
pub use migrate::{
    migrate_legacy_media, plan_migration, MigrationFailure, MigrationPlan, MigrationReport,
    PendingInsert,
};
pub use package::SubjectPackage;
pub use persist::{InMemoryStateStore, JsonFileStateStore, StateStore};
