use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

use super::constants::{ALL_KNOWN_TAGS_SERVICE, CURRENT_TAG_STATUS};

/// Ephemeral numeric id the client assigns to a file. Only valid for one session.
pub type FileId = u64;

/// Metadata of a single file as reported by `/get_files/file_metadata`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FileMetadata {
    #[serde(default)]
    pub file_id: Option<FileId>,
    pub hash: String,
    /// service name -> tag status -> tags
    #[serde(default)]
    pub service_names_to_statuses_to_tags: HashMap<String, HashMap<String, Vec<String>>>,
}

impl FileMetadata {
    pub fn new(hash: impl Into<String>) -> Self {
        Self {
            file_id: None,
            hash: hash.into(),
            service_names_to_statuses_to_tags: HashMap::new(),
        }
    }

    /// Set the current tags of `service`, replacing whatever was there.
    pub fn with_current_tags<I, S>(mut self, service: &str, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.service_names_to_statuses_to_tags
            .entry(service.to_string())
            .or_default()
            .insert(
                CURRENT_TAG_STATUS.to_string(),
                tags.into_iter().map(Into::into).collect(),
            );
        self
    }

    /// Tags currently applied on the named service. Empty if the service is unknown.
    pub fn current_tags(&self, service: &str) -> &[String] {
        self.service_names_to_statuses_to_tags
            .get(service)
            .and_then(|statuses| statuses.get(CURRENT_TAG_STATUS))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Current tags across every tag service.
    pub fn all_known_tags(&self) -> &[String] {
        self.current_tags(ALL_KNOWN_TAGS_SERVICE)
    }
}

/// Outcome of `/add_files/add_file`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "u8")]
pub enum ImportStatus {
    Success,
    Exists,
    PreviouslyDeleted,
    Failed,
    Vetoed,
    Unknown(u8),
}

impl From<u8> for ImportStatus {
    fn from(code: u8) -> Self {
        match code {
            1 => ImportStatus::Success,
            2 => ImportStatus::Exists,
            3 => ImportStatus::PreviouslyDeleted,
            4 => ImportStatus::Failed,
            7 => ImportStatus::Vetoed,
            other => ImportStatus::Unknown(other),
        }
    }
}

impl ImportStatus {
    /// Whether the file is in the client after the import.
    pub fn is_present(self) -> bool {
        matches!(self, ImportStatus::Success | ImportStatus::Exists)
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportStatus::Success => write!(f, "success"),
            ImportStatus::Exists => write!(f, "already in db"),
            ImportStatus::PreviouslyDeleted => write!(f, "previously deleted"),
            ImportStatus::Failed => write!(f, "failed"),
            ImportStatus::Vetoed => write!(f, "vetoed"),
            ImportStatus::Unknown(code) => write!(f, "unknown status {code}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImportResult {
    pub status: ImportStatus,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub note: String,
}

/// Basic permissions of a client API access key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ImportUrls,
    ImportFiles,
    AddTags,
    SearchFiles,
    ManagePages,
    ManageCookies,
    ManageDatabase,
    AddNotes,
}

impl Permission {
    pub fn code(self) -> u8 {
        match self {
            Permission::ImportUrls => 0,
            Permission::ImportFiles => 1,
            Permission::AddTags => 2,
            Permission::SearchFiles => 3,
            Permission::ManagePages => 4,
            Permission::ManageCookies => 5,
            Permission::ManageDatabase => 6,
            Permission::AddNotes => 7,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Permission::ImportUrls => "import urls",
            Permission::ImportFiles => "import files",
            Permission::AddTags => "add tags",
            Permission::SearchFiles => "search files",
            Permission::ManagePages => "manage pages",
            Permission::ManageCookies => "manage cookies",
            Permission::ManageDatabase => "manage database",
            Permission::AddNotes => "add notes",
        };
        write!(f, "{name}")
    }
}

/// Tag action on a local tag service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagAction {
    Add,
    Delete,
}

impl TagAction {
    /// Key used in `service_names_to_actions_to_tags`.
    pub fn code(self) -> &'static str {
        match self {
            TagAction::Add => "0",
            TagAction::Delete => "1",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_deserializes_service_tags() {
        let json = r#"{
            "file_id": 42,
            "hash": "abc",
            "service_names_to_statuses_to_tags": {
                "my tags": {"0": ["test", "rare"], "2": ["pending"]},
                "all known tags": {"0": ["test", "rare", "series:frozen"]}
            }
        }"#;
        let metadata: FileMetadata = serde_json::from_str(json).unwrap();

        assert_eq!(metadata.file_id, Some(42));
        assert_eq!(metadata.current_tags("my tags"), ["test", "rare"]);
        assert_eq!(metadata.all_known_tags().len(), 3);
        assert!(metadata.current_tags("public tag repository").is_empty());
    }

    #[test]
    fn test_metadata_without_tags() {
        let metadata: FileMetadata = serde_json::from_str(r#"{"hash": "abc"}"#).unwrap();
        assert_eq!(metadata.file_id, None);
        assert!(metadata.all_known_tags().is_empty());
    }

    #[test]
    fn test_import_status_codes() {
        assert_eq!(ImportStatus::from(1), ImportStatus::Success);
        assert_eq!(ImportStatus::from(2), ImportStatus::Exists);
        assert_eq!(ImportStatus::from(3), ImportStatus::PreviouslyDeleted);
        assert_eq!(ImportStatus::from(4), ImportStatus::Failed);
        assert_eq!(ImportStatus::from(7), ImportStatus::Vetoed);
        assert_eq!(ImportStatus::from(5), ImportStatus::Unknown(5));
        assert!(ImportStatus::Exists.is_present());
        assert!(!ImportStatus::Vetoed.is_present());
    }

    #[test]
    fn test_import_result_deserializes() {
        let result: ImportResult =
            serde_json::from_str(r#"{"status": 4, "hash": "abc", "note": "disk full"}"#).unwrap();
        assert_eq!(result.status, ImportStatus::Failed);
        assert_eq!(result.hash.as_deref(), Some("abc"));
        assert_eq!(result.note, "disk full");
    }
}
