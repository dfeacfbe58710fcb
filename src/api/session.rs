//! Access key provisioning and permission checks.
//!
//! The access key is cached in a plain file between runs. Without that file
//! the user is walked through granting tagscore a new key in the client.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::client::{is_auth_rejection, HydrusClient};
use super::error::ApiError;
use crate::config::Settings;
use crate::models::constants::API_CLIENT_NAME;
use crate::models::Permission;

/// Permissions tagscore needs for a run.
pub const REQUIRED_PERMISSIONS: [Permission; 3] = [
    Permission::AddTags,
    Permission::SearchFiles,
    Permission::ImportFiles,
];

/// Fatal problems while setting up a session. Each carries remediation text.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("tagscore does not have the proper permissions (missing: {})", format_permissions(.missing))]
    MissingPermissions { missing: Vec<Permission> },

    #[error("The client rejected the saved access key")]
    KeyRejected(#[source] ApiError),

    #[error("Could not read the access key from {}", path.display())]
    KeyUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not save access key to file {}", path.display())]
    KeyNotSaved {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("The access key file {} is empty", .0.display())]
    KeyEmpty(PathBuf),

    #[error("Could not prompt for a new access key")]
    Prompt(#[source] io::Error),

    #[error("Could not request a new access key from the client")]
    KeyRequest(#[source] ApiError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SetupError {
    /// What the user can do about it.
    pub fn remediation(&self) -> &'static str {
        match self {
            SetupError::MissingPermissions { .. } | SetupError::KeyRejected(_) => {
                "Try deleting the tagscore api service in the client and setting the service up again. \
                 (This will not remove any of the saved scores.)"
            }
            SetupError::KeyUnreadable { .. } | SetupError::KeyEmpty(_) => {
                "Delete the access key file and run tagscore again to request a new key."
            }
            SetupError::KeyNotSaved { .. } => {
                "Make sure the access key location is writable, or point access_key_path somewhere that is."
            }
            SetupError::Prompt(_) => {
                "Run tagscore from an interactive terminal to set up an access key."
            }
            SetupError::KeyRequest(_) | SetupError::Api(_) => {
                "Make sure the client is running and its client api service is enabled."
            }
        }
    }
}

fn format_permissions(permissions: &[Permission]) -> String {
    permissions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Permissions from `required` that are not among the granted codes.
pub fn missing_permissions(granted: &[u8], required: &[Permission]) -> Vec<Permission> {
    required
        .iter()
        .copied()
        .filter(|permission| !granted.contains(&permission.code()))
        .collect()
}

/// Read the cached access key. `Ok(None)` if the cache file does not exist.
pub fn read_access_key(path: &Path) -> Result<Option<String>, SetupError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(SetupError::KeyUnreadable {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let key = content.lines().next().unwrap_or_default().trim();
    if key.is_empty() {
        return Err(SetupError::KeyEmpty(path.to_path_buf()));
    }
    Ok(Some(key.to_string()))
}

pub fn save_access_key(path: &Path, key: &str) -> Result<(), SetupError> {
    fs::write(path, key).map_err(|source| SetupError::KeyNotSaved {
        path: path.to_path_buf(),
        source,
    })
}

/// Remove the cached key so the next run provisions a fresh one.
pub fn forget_access_key(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => info!(path = %path.display(), "removed cached access key"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove cached access key"),
    }
}

fn write_prompt<W: Write>(output: &mut W) -> io::Result<()> {
    writeln!(output, "tagscore needs an access key for the client api.")?;
    writeln!(
        output,
        "In the client open services -> review services -> client api, press 'add' and choose 'from api request'."
    )?;
    write!(output, "Press enter once that dialog is open...")?;
    output.flush()
}

fn write_key_received<W: Write>(output: &mut W) -> io::Result<()> {
    writeln!(output, "Received a key. Press 'apply' in the client dialog to finish.")?;
    output.flush()
}

/// Walk the user through accepting a permission request in the client and
/// return the new key.
pub fn request_access_key<R: BufRead, W: Write>(
    client: &HydrusClient,
    input: &mut R,
    output: &mut W,
) -> Result<String, SetupError> {
    write_prompt(output).map_err(SetupError::Prompt)?;

    let mut line = String::new();
    input.read_line(&mut line).map_err(SetupError::Prompt)?;

    let key = client
        .request_new_permissions(API_CLIENT_NAME, &REQUIRED_PERMISSIONS)
        .map_err(SetupError::KeyRequest)?;

    write_key_received(output).map_err(SetupError::Prompt)?;
    Ok(key)
}

/// Build a client carrying a verified access key.
///
/// Reads the cached key or provisions a new one, then checks the key grants
/// [`REQUIRED_PERMISSIONS`]. A key without them is removed from the cache.
pub fn open_session(settings: &Settings) -> Result<HydrusClient, SetupError> {
    let client = HydrusClient::new(settings)?;
    let key_path = settings.access_key_path.as_path();

    let key = match read_access_key(key_path)? {
        Some(key) => key,
        None => {
            debug!(path = %key_path.display(), "no cached access key");
            let stdin = io::stdin();
            let key = request_access_key(&client, &mut stdin.lock(), &mut io::stdout())?;
            save_access_key(key_path, &key)?;
            info!(path = %key_path.display(), "saved new access key");
            key
        }
    };

    let client = client.with_access_key(key);
    let info = match client.verify_access_key() {
        Ok(info) => info,
        Err(e) if is_auth_rejection(&e) => {
            forget_access_key(key_path);
            return Err(SetupError::KeyRejected(e));
        }
        Err(e) => return Err(e.into()),
    };
    debug!(description = %info.human_description, "verified access key");

    let missing = missing_permissions(&info.basic_permissions, &REQUIRED_PERMISSIONS);
    if !missing.is_empty() {
        forget_access_key(key_path);
        return Err(SetupError::MissingPermissions { missing });
    }

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_permissions() {
        assert!(missing_permissions(&[0, 1, 2, 3], &REQUIRED_PERMISSIONS).is_empty());
        assert_eq!(
            missing_permissions(&[1, 2], &REQUIRED_PERMISSIONS),
            vec![Permission::SearchFiles]
        );
        assert_eq!(missing_permissions(&[], &REQUIRED_PERMISSIONS).len(), 3);
    }

    #[test]
    fn test_missing_permissions_message() {
        let err = SetupError::MissingPermissions {
            missing: vec![Permission::AddTags, Permission::ImportFiles],
        };
        assert_eq!(
            err.to_string(),
            "tagscore does not have the proper permissions (missing: add tags, import files)"
        );
        assert!(err.remediation().contains("setting the service up again"));
    }

    struct ClosedOutput;

    impl Write for ClosedOutput {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_prompt_messages() {
        let mut output = Vec::new();
        write_prompt(&mut output).unwrap();
        write_key_received(&mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("from api request"));
        assert!(text.ends_with("Press 'apply' in the client dialog to finish.\n"));
    }

    #[test]
    fn test_prompt_write_failures_are_reported() {
        let err = write_key_received(&mut ClosedOutput).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);

        let err = SetupError::Prompt(err);
        assert!(matches!(err, SetupError::Prompt(_)));
        assert!(write_prompt(&mut ClosedOutput).is_err());
    }

    #[test]
    fn test_access_key_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("access_key");

        assert_eq!(read_access_key(&path).unwrap(), None);
        save_access_key(&path, "0123abcd").unwrap();
        assert_eq!(read_access_key(&path).unwrap().as_deref(), Some("0123abcd"));

        forget_access_key(&path);
        assert!(!path.exists());
        // Forgetting twice is harmless
        forget_access_key(&path);
    }

    #[test]
    fn test_access_key_uses_first_line_trimmed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("access_key");
        fs::write(&path, "  feedface \nleftover\n").unwrap();

        assert_eq!(read_access_key(&path).unwrap().as_deref(), Some("feedface"));
    }

    #[test]
    fn test_empty_access_key_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("access_key");
        fs::write(&path, "\n").unwrap();

        assert!(matches!(read_access_key(&path), Err(SetupError::KeyEmpty(_))));
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("access_key");

        let err = save_access_key(&path, "key").unwrap_err();
        assert!(matches!(err, SetupError::KeyNotSaved { .. }));
        assert!(err.to_string().starts_with("Could not save access key to file"));
    }
}
