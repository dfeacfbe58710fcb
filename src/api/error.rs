use thiserror::Error;

/// Failure of a single call into the hydrus client API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Could not reach the client API at {endpoint}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint}: HTTP {status} - {message}")]
    Status {
        endpoint: &'static str,
        status: u16,
        message: String,
    },

    #[error("Failed to decode response from {endpoint}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid client API url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to encode request parameter")]
    Encode(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status of a rejected call, if the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the service answered but refused the request.
    pub fn is_rejection(&self) -> bool {
        self.status().is_some()
    }
}
