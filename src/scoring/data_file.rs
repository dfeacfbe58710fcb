//! The data file: a file in the client whose tags hold the tag weights.
//!
//! It is found by its content hash and imported from a local copy when the
//! client does not have it yet.

use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::weights::WeightMapping;
use crate::api::{ApiError, MetadataQuery, TagService};
use crate::models::constants::{DATA_FILE_HASH, DATA_FILE_UNIQUE_TAG, TAG_REPO_NAME};
use crate::models::{ImportResult, ImportStatus, TagAction};
use crate::validation::ScoreTagError;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Found {} malformed score tags on the data file", .0.len())]
    Malformed(Vec<ScoreTagError>),

    #[error("The client returned no metadata for the data file")]
    MissingMetadata,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// How the data file came to be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFileState {
    AlreadyPresent,
    Imported,
}

/// An import of the data file that left the client without it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFailure {
    pub status: ImportStatus,
    pub note: String,
    pub path: PathBuf,
}

impl fmt::Display for ImportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path.display();
        match self.status {
            ImportStatus::PreviouslyDeleted => write!(
                f,
                "The tagscore data file was previously deleted.\n\
                 Please remove the deletion record for the data file and try again.\n\
                 The easiest way to do this is to import the data file by hand, see it fail, \
                 go to the file import status, right click the file import, \
                 choose the try again option, and answer yes when the client asks whether \
                 to remove deletion records for that file.\n\
                 You can find the data file here: {path}"
            ),
            ImportStatus::Failed => write!(
                f,
                "The tagscore data file failed to import. Please resolve this error and try again:\n{}",
                self.note
            ),
            ImportStatus::Vetoed => write!(
                f,
                "The tagscore data file failed to import due to an import veto.\n\
                 This often means the client's import options (options -> importing) \
                 prevent the data file from importing.\n\
                 Please remove these preventions and try again.\n\
                 You can find the data file here: {path}"
            ),
            _ => write!(
                f,
                "The tagscore data file failed to import due to an unknown issue ({}).\n\
                 Please try updating tagscore or resolving the following issue (if any):\n{}",
                self.status, self.note
            ),
        }
    }
}

/// Whether the client has the data file.
///
/// A rejected lookup counts as absent; only transport level failures are errors.
pub fn locate_data_file(service: &dyn TagService) -> Result<bool, ApiError> {
    match service.has_file(DATA_FILE_HASH) {
        Ok(found) => Ok(found),
        Err(e) if e.is_rejection() => {
            debug!(error = %e, "data file lookup rejected, treating as absent");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Make sure the client has the data file, importing `path` if it does not.
///
/// Returns `Ok(Err(..))` when the client refused the import.
pub fn ensure_data_file_present(
    service: &dyn TagService,
    path: &Path,
) -> Result<Result<DataFileState, ImportFailure>, ApiError> {
    if locate_data_file(service)? {
        debug!("data file present");
        return Ok(Ok(DataFileState::AlreadyPresent));
    }

    info!(path = %path.display(), "data file missing, importing");
    check_local_copy(path);

    let ImportResult { status, hash, note } = service.import_file(path)?;
    if !status.is_present() {
        warn!(%status, %note, "data file import failed");
        return Ok(Err(ImportFailure {
            status,
            note,
            path: path.to_path_buf(),
        }));
    }

    let hash = hash.unwrap_or_else(|| DATA_FILE_HASH.to_string());
    service.mutate_tags(
        &hash,
        TAG_REPO_NAME,
        TagAction::Add,
        &[DATA_FILE_UNIQUE_TAG.to_string()],
    )?;
    info!(%status, "data file imported");
    Ok(Ok(DataFileState::Imported))
}

/// Warn if the local copy is not the data file tagscore looks for.
fn check_local_copy(path: &Path) {
    match fs::read(path) {
        Ok(bytes) => {
            let hash = compute_sha256(&bytes);
            if hash != DATA_FILE_HASH {
                warn!(
                    path = %path.display(),
                    expected = DATA_FILE_HASH,
                    actual = %hash,
                    "local data file does not match the expected hash"
                );
            }
        }
        Err(e) => warn!(path = %path.display(), error = %e, "cannot read local data file"),
    }
}

pub fn compute_sha256(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Tags of the data file on the target tag service, marker included.
pub fn data_file_tags(service: &dyn TagService) -> Result<Vec<String>, LoadError> {
    let hashes = [DATA_FILE_HASH.to_string()];
    service
        .file_metadata(MetadataQuery::Hashes(&hashes))?
        .into_iter()
        .find(|metadata| metadata.hash == DATA_FILE_HASH)
        .map(|metadata| metadata.current_tags(TAG_REPO_NAME).to_vec())
        .ok_or(LoadError::MissingMetadata)
}

/// Read and validate the weight mapping stored on the data file.
pub fn load_weight_mapping(service: &dyn TagService) -> Result<WeightMapping, LoadError> {
    let tags = data_file_tags(service)?;
    let weights = WeightMapping::from_data_file_tags(&tags).map_err(LoadError::Malformed)?;
    debug!(count = weights.len(), "loaded tag weights");
    Ok(weights)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_sha256() {
        assert_eq!(
            compute_sha256(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(compute_sha256(b"tagscore").len(), 64);
    }

    #[test]
    fn test_previously_deleted_message_points_at_file() {
        let failure = ImportFailure {
            status: ImportStatus::PreviouslyDeleted,
            note: String::new(),
            path: PathBuf::from("/srv/data_file.png"),
        };
        let message = failure.to_string();
        assert!(message.contains("previously deleted"));
        assert!(message.contains("/srv/data_file.png"));
    }

    #[test]
    fn test_failed_message_includes_note() {
        let failure = ImportFailure {
            status: ImportStatus::Failed,
            note: "file is corrupt".to_string(),
            path: PathBuf::from("data_file.png"),
        };
        assert!(failure.to_string().ends_with("file is corrupt"));
    }

    #[test]
    fn test_vetoed_and_unknown_messages() {
        let vetoed = ImportFailure {
            status: ImportStatus::Vetoed,
            note: String::new(),
            path: PathBuf::from("data_file.png"),
        };
        assert!(vetoed.to_string().contains("import veto"));

        let unknown = ImportFailure {
            status: ImportStatus::Unknown(9),
            note: "strange".to_string(),
            path: PathBuf::from("data_file.png"),
        };
        let message = unknown.to_string();
        assert!(message.contains("unknown issue (unknown status 9)"));
        assert!(message.ends_with("strange"));
    }
}
