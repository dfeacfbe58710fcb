//! Access to the hydrus client API.
//!
//! The scoring pipeline only talks to the [`TagService`] trait, so it can run
//! against [`HydrusClient`] or against an in-memory service in tests.

pub mod client;
pub mod error;
pub mod session;

pub use client::HydrusClient;
pub use error::ApiError;
pub use session::{open_session, SetupError, REQUIRED_PERMISSIONS};

use std::path::Path;

use crate::models::{FileId, FileMetadata, ImportResult, TagAction};

/// Selects the files of a metadata request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataQuery<'a> {
    FileIds(&'a [FileId]),
    Hashes(&'a [String]),
}

/// Operations the scoring pipeline needs from the tag service.
///
/// All calls are blocking and issued one after another.
pub trait TagService {
    /// Whether a file with the given SHA-256 hash is in the client.
    fn has_file(&self, hash: &str) -> Result<bool, ApiError>;

    /// Import a file from a path on the machine running the client.
    fn import_file(&self, path: &Path) -> Result<ImportResult, ApiError>;

    /// Ids of all files carrying `tag`.
    fn search_files_by_tag(&self, tag: &str) -> Result<Vec<FileId>, ApiError>;

    fn file_metadata(&self, query: MetadataQuery<'_>) -> Result<Vec<FileMetadata>, ApiError>;

    /// Add or delete `tags` on one file within a single tag service.
    fn mutate_tags(
        &self,
        hash: &str,
        service: &str,
        action: TagAction,
        tags: &[String],
    ) -> Result<(), ApiError>;
}
