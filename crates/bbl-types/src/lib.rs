//! Foundation types for Bluebird Learn.
//!
//! This crate provides the data model shared by the storage, archive and
//! packaging crates. It has no knowledge of how records are persisted or
//! packaged.
//!
//! # Key Types
//!
//! - [`MediaKey`]: installation-local key of a stored binary object
//! - [`MediaRef`]: a topic's reference to its media (local key or archive path)
//! - [`Subject`] / [`Topic`]: built-in content catalog entries
//! - [`TeacherTopic`]: user-recorded topic owned by a subject
//! - [`ContentState`]: the persisted application document

pub mod content;
pub mod error;
pub mod key;
pub mod media;
pub mod state;

pub use content::{Subject, TeacherTopic, Topic};
pub use error::TypeError;
pub use key::{generate_id, unix_millis, MediaKey};
pub use media::MediaRef;
pub use state::ContentState;
