use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Upstream answered with a non-success status.
    #[error("Upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: Value },

    #[error("Upstream returned non-JSON content type {content_type:?} (HTTP {status})")]
    InvalidContentType { status: u16, content_type: String },

    /// Connection refused, reset or timed out before a response arrived.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode upstream response: {0}")]
    Decode(String),

    #[error("Invalid upstream URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),
}

impl ApiError {
    /// Server errors, rate limiting and transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Status { status, .. } => {
                *status >= 500 || *status == StatusCode::TOO_MANY_REQUESTS.as_u16()
            }
            ApiError::Transport(_) => true,
            _ => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } | ApiError::InvalidContentType { status, .. } => {
                Some(*status)
            }
            ApiError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }

    /// True for 401/403 answers from the upstream.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }
}
