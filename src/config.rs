//! Settings for a tagscore run.
//!
//! Values come from `tagscore.toml` (or the file passed with `--config`),
//! then from `TAGSCORE_*` environment variables, then from built-in defaults.

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Settings file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "tagscore.toml";

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:45869";
pub const DEFAULT_ACCESS_KEY_PATH: &str = "access_key";
pub const DEFAULT_DATA_FILE_PATH: &str = "../data_file.png";

pub const ENV_API_URL: &str = "TAGSCORE_API_URL";
pub const ENV_ACCESS_KEY_PATH: &str = "TAGSCORE_ACCESS_KEY_PATH";
pub const ENV_DATA_FILE: &str = "TAGSCORE_DATA_FILE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Settings file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read settings file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to resolve data file path {}", path.display())]
    DataFilePath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Base url of the client API
    pub api_url: String,
    /// File caching the client API access key between runs
    pub access_key_path: PathBuf,
    /// Local copy of the data file, imported when the client lacks it
    pub data_file_path: PathBuf,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            access_key_path: PathBuf::from(DEFAULT_ACCESS_KEY_PATH),
            data_file_path: PathBuf::from(DEFAULT_DATA_FILE_PATH),
            connect_timeout_secs: 10,
            request_timeout_secs: 120,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from [`DEFAULT_CONFIG_FILE`] if it exists,
    /// and apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Self::from_file(path)?
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };

        settings.apply_env_overrides();
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(url) = non_empty_env(ENV_API_URL) {
            self.api_url = url;
        }
        if let Some(path) = non_empty_env(ENV_ACCESS_KEY_PATH) {
            self.access_key_path = PathBuf::from(path);
        }
        if let Some(path) = non_empty_env(ENV_DATA_FILE) {
            self.data_file_path = PathBuf::from(path);
        }
    }

    /// Absolute path of the data file. The client resolves import paths on
    /// its own side, so relative paths are made absolute against the working
    /// directory.
    pub fn absolute_data_file_path(&self) -> Result<PathBuf, ConfigError> {
        if self.data_file_path.is_absolute() {
            return Ok(self.data_file_path.clone());
        }
        env::current_dir()
            .map(|cwd| cwd.join(&self.data_file_path))
            .map_err(|source| ConfigError::DataFilePath {
                path: self.data_file_path.clone(),
                source,
            })
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn clear_env() {
        env::remove_var(ENV_API_URL);
        env::remove_var(ENV_ACCESS_KEY_PATH);
        env::remove_var(ENV_DATA_FILE);
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.api_url, "http://127.0.0.1:45869");
        assert_eq!(settings.access_key_path, PathBuf::from("access_key"));
        assert_eq!(settings.data_file_path, PathBuf::from("../data_file.png"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = Settings::from_toml(r#"api_url = "http://10.0.0.2:45869""#).unwrap();
        assert_eq!(settings.api_url, "http://10.0.0.2:45869");
        assert_eq!(settings.request_timeout_secs, 120);
        assert_eq!(settings.access_key_path, PathBuf::from("access_key"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(Settings::from_toml("api_uri = \"http://localhost\"").is_err());
    }

    #[test]
    #[serial]
    fn test_load_explicit_missing_file() {
        clear_env();
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.toml");

        let err = Settings::load(Some(&missing)).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    #[serial]
    fn test_load_from_file_with_env_override() {
        clear_env();
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tagscore.toml");
        fs::write(
            &path,
            "api_url = \"http://192.168.1.5:45869\"\ndata_file_path = \"/srv/data_file.png\"\n",
        )
        .unwrap();

        env::set_var(ENV_ACCESS_KEY_PATH, "/tmp/tagscore_key");
        let settings = Settings::load(Some(&path)).unwrap();
        clear_env();

        assert_eq!(settings.api_url, "http://192.168.1.5:45869");
        assert_eq!(settings.data_file_path, PathBuf::from("/srv/data_file.png"));
        assert_eq!(settings.access_key_path, PathBuf::from("/tmp/tagscore_key"));
    }

    #[test]
    #[serial]
    fn test_blank_env_is_ignored() {
        clear_env();
        env::set_var(ENV_API_URL, "  ");
        let mut settings = Settings::default();
        settings.apply_env_overrides();
        clear_env();

        assert_eq!(settings.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_absolute_data_file_path() {
        let settings = Settings::default();
        let path = settings.absolute_data_file_path().unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("data_file.png"));
    }
}
