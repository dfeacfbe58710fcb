//! Blocking HTTP client for the hydrus client API.

use reqwest::blocking::{Client, Response};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use super::error::ApiError;
use super::{MetadataQuery, TagService};
use crate::config::Settings;
use crate::models::{FileId, FileMetadata, ImportResult, Permission, TagAction};

const ACCESS_KEY_HEADER: &str = "Hydrus-Client-API-Access-Key";

/// Longest response body quoted in an error message.
const MAX_ERROR_BODY_CHARS: usize = 300;

mod endpoint {
    pub(super) const VERIFY_ACCESS_KEY: &str = "/verify_access_key";
    pub(super) const REQUEST_NEW_PERMISSIONS: &str = "/request_new_permissions";
    pub(super) const GET_FILE: &str = "/get_files/file";
    pub(super) const SEARCH_FILES: &str = "/get_files/search_files";
    pub(super) const FILE_METADATA: &str = "/get_files/file_metadata";
    pub(super) const ADD_FILE: &str = "/add_files/add_file";
    pub(super) const ADD_TAGS: &str = "/add_tags/add_tags";
}

/// Permissions granted to an access key.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyInfo {
    #[serde(default)]
    pub basic_permissions: Vec<u8>,
    #[serde(default)]
    pub human_description: String,
}

#[derive(Deserialize)]
struct NewAccessKey {
    access_key: String,
}

#[derive(Deserialize)]
struct SearchFilesResponse {
    file_ids: Vec<FileId>,
}

#[derive(Deserialize)]
struct FileMetadataResponse {
    metadata: Vec<FileMetadata>,
}

#[derive(Serialize)]
struct AddFileRequest<'a> {
    path: &'a Path,
}

#[derive(Serialize)]
struct AddTagsRequest<'a> {
    hash: &'a str,
    service_names_to_actions_to_tags: HashMap<&'a str, HashMap<&'static str, &'a [String]>>,
}

#[derive(Debug, Clone)]
pub struct HydrusClient {
    http: Client,
    base_url: String,
    access_key: Option<String>,
}

impl HydrusClient {
    /// Create a client without an access key. Only key provisioning works
    /// until [`HydrusClient::with_access_key`] is applied.
    pub fn new(settings: &Settings) -> Result<Self, ApiError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .user_agent(concat!("tagscore/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ApiError::Transport {
                endpoint: "client setup",
                source,
            })?;

        Ok(Self {
            http,
            base_url: settings.api_url.trim_end_matches('/').to_string(),
            access_key: None,
        })
    }

    pub fn with_access_key(mut self, access_key: impl Into<String>) -> Self {
        self.access_key = Some(access_key.into());
        self
    }

    pub fn verify_access_key(&self) -> Result<KeyInfo, ApiError> {
        let response = self.get(endpoint::VERIFY_ACCESS_KEY, &[])?;
        decode(response, endpoint::VERIFY_ACCESS_KEY)
    }

    /// Ask the client for a new access key. The user has to accept the
    /// request in the client's permission dialog for this to return.
    pub fn request_new_permissions(
        &self,
        name: &str,
        permissions: &[Permission],
    ) -> Result<String, ApiError> {
        let codes: Vec<u8> = permissions.iter().map(|p| p.code()).collect();
        let params = [
            ("name", name.to_string()),
            ("basic_permissions", serde_json::to_string(&codes)?),
        ];
        let response = self.get(endpoint::REQUEST_NEW_PERMISSIONS, &params)?;
        let key: NewAccessKey = decode(response, endpoint::REQUEST_NEW_PERMISSIONS)?;
        Ok(key.access_key)
    }

    fn url(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Url, ApiError> {
        let raw = format!("{}{endpoint}", self.base_url);
        Url::parse_with_params(&raw, params).map_err(|e| ApiError::InvalidUrl {
            url: raw,
            reason: e.to_string(),
        })
    }

    fn get(&self, endpoint: &'static str, params: &[(&str, String)]) -> Result<Response, ApiError> {
        let url = self.url(endpoint, params)?;
        debug!(%url, "GET");
        let mut request = self.http.get(url);
        if let Some(key) = &self.access_key {
            request = request.header(ACCESS_KEY_HEADER, key);
        }
        let response = request
            .send()
            .map_err(|source| ApiError::Transport { endpoint, source })?;
        validate_response_status(response, endpoint)
    }

    fn post_json<B: Serialize>(
        &self,
        endpoint: &'static str,
        body: &B,
    ) -> Result<Response, ApiError> {
        let url = self.url(endpoint, &[])?;
        debug!(%url, "POST");
        let mut request = self.http.post(url).json(body);
        if let Some(key) = &self.access_key {
            request = request.header(ACCESS_KEY_HEADER, key);
        }
        let response = request
            .send()
            .map_err(|source| ApiError::Transport { endpoint, source })?;
        validate_response_status(response, endpoint)
    }
}

impl TagService for HydrusClient {
    fn has_file(&self, hash: &str) -> Result<bool, ApiError> {
        match self.get(endpoint::GET_FILE, &[("hash", hash.to_string())]) {
            // The body is the file itself; dropping the response discards it
            Ok(_) => Ok(true),
            Err(ApiError::Status { status: 404, .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn import_file(&self, path: &Path) -> Result<ImportResult, ApiError> {
        let response = self.post_json(endpoint::ADD_FILE, &AddFileRequest { path })?;
        decode(response, endpoint::ADD_FILE)
    }

    fn search_files_by_tag(&self, tag: &str) -> Result<Vec<FileId>, ApiError> {
        let tags = serde_json::to_string(&[tag])?;
        let response = self.get(endpoint::SEARCH_FILES, &[("tags", tags)])?;
        let found: SearchFilesResponse = decode(response, endpoint::SEARCH_FILES)?;
        Ok(found.file_ids)
    }

    fn file_metadata(&self, query: MetadataQuery<'_>) -> Result<Vec<FileMetadata>, ApiError> {
        let param = match query {
            MetadataQuery::FileIds(ids) => ("file_ids", serde_json::to_string(ids)?),
            MetadataQuery::Hashes(hashes) => ("hashes", serde_json::to_string(hashes)?),
        };
        let response = self.get(endpoint::FILE_METADATA, &[param])?;
        let found: FileMetadataResponse = decode(response, endpoint::FILE_METADATA)?;
        Ok(found.metadata)
    }

    fn mutate_tags(
        &self,
        hash: &str,
        service: &str,
        action: TagAction,
        tags: &[String],
    ) -> Result<(), ApiError> {
        let request = AddTagsRequest {
            hash,
            service_names_to_actions_to_tags: HashMap::from([(
                service,
                HashMap::from([(action.code(), tags)]),
            )]),
        };
        self.post_json(endpoint::ADD_TAGS, &request)?;
        Ok(())
    }
}

/// Turn a non-success response into [`ApiError::Status`], quoting the body
/// the client sent along with it.
fn validate_response_status(
    response: Response,
    endpoint: &'static str,
) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect()
    };

    Err(ApiError::Status {
        endpoint,
        status: status.as_u16(),
        message,
    })
}

fn decode<T: DeserializeOwned>(response: Response, endpoint: &'static str) -> Result<T, ApiError> {
    response
        .json()
        .map_err(|source| ApiError::Decode { endpoint, source })
}

/// Whether a rejected call means the access key itself is not accepted.
pub fn is_auth_rejection(err: &ApiError) -> bool {
    matches!(
        err.status().and_then(|code| StatusCode::from_u16(code).ok()),
        Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HydrusClient {
        HydrusClient::new(&Settings {
            api_url: "http://127.0.0.1:45869/".to_string(),
            ..Settings::default()
        })
        .unwrap()
    }

    #[test]
    fn test_url_encodes_json_params() {
        let tags = serde_json::to_string(&["tagscore meta:score me"]).unwrap();
        let url = client()
            .url(endpoint::SEARCH_FILES, &[("tags", tags)])
            .unwrap();

        assert_eq!(url.path(), "/get_files/search_files");
        let (key, value) = url.query_pairs().next().unwrap();
        assert_eq!(key, "tags");
        assert_eq!(value, r#"["tagscore meta:score me"]"#);
    }

    #[test]
    fn test_trailing_slash_in_base_url() {
        let url = client().url(endpoint::VERIFY_ACCESS_KEY, &[]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:45869/verify_access_key");
    }

    #[test]
    fn test_invalid_base_url() {
        let client = HydrusClient::new(&Settings {
            api_url: "not a url".to_string(),
            ..Settings::default()
        })
        .unwrap();
        let err = client.url(endpoint::GET_FILE, &[]).unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl { .. }));
    }

    #[test]
    fn test_add_tags_request_shape() {
        let tags = vec!["tagscore tag score:3".to_string()];
        let request = AddTagsRequest {
            hash: "abc",
            service_names_to_actions_to_tags: HashMap::from([(
                "my tags",
                HashMap::from([(TagAction::Delete.code(), tags.as_slice())]),
            )]),
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "hash": "abc",
                "service_names_to_actions_to_tags": {
                    "my tags": {"1": ["tagscore tag score:3"]}
                }
            })
        );
    }

    #[test]
    fn test_auth_rejection() {
        let rejected = ApiError::Status {
            endpoint: endpoint::VERIFY_ACCESS_KEY,
            status: 403,
            message: "Forbidden".to_string(),
        };
        let missing = ApiError::Status {
            endpoint: endpoint::GET_FILE,
            status: 404,
            message: "Not Found".to_string(),
        };
        assert!(is_auth_rejection(&rejected));
        assert!(!is_auth_rejection(&missing));
    }
}
