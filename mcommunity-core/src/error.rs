//! Error types for directory API calls.

use reqwest::StatusCode;
use thiserror::Error;

/// Error type for all directory API operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The token endpoint was unreachable or rejected the credentials.
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    /// The requested person or group does not exist.
    #[error("not found ({status}): {body}")]
    NotFound { status: StatusCode, body: String },

    /// A group with the same name or email already exists.
    #[error("conflict ({status}): {body}")]
    Conflict { status: StatusCode, body: String },

    /// The request body was rejected by the server.
    #[error("validation error ({status}): {body}")]
    Validation { status: StatusCode, body: String },

    /// The bearer token was rejected for this resource.
    #[error("unauthorized ({status}): {body}")]
    Unauthorized { status: StatusCode, body: String },

    /// Any other non-success response.
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// Network or connection failure.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The base URL or a derived endpoint URL is invalid.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Configuration is missing or malformed.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl ApiError {
    /// Classify a non-success response.
    pub fn from_status(status: StatusCode, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            StatusCode::NOT_FOUND => Self::NotFound { status, body },
            StatusCode::CONFLICT => Self::Conflict { status, body },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized { status, body },
            s if s.is_client_error() => Self::Validation { status, body },
            _ => Self::Status { status, body },
        }
    }

    /// The HTTP status carried by this error, if it came from a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::NotFound { status, .. }
            | Self::Conflict { status, .. }
            | Self::Validation { status, .. }
            | Self::Unauthorized { status, .. }
            | Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }
}

/// Result type for directory API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_classification() {
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, ""),
            ApiError::NotFound { .. }
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::CONFLICT, "exists"),
            ApiError::Conflict { .. }
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_REQUEST, "dup member"),
            ApiError::Validation { .. }
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, ""),
            ApiError::Unauthorized { .. }
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, ""),
            ApiError::Status { .. }
        ));
    }

    #[test]
    fn test_status_preserves_body() {
        let err = ApiError::from_status(StatusCode::CONFLICT, r#"{"cn":["exists"]}"#);
        assert_eq!(err.status(), Some(StatusCode::CONFLICT));
        assert!(err.to_string().contains(r#"{"cn":["exists"]}"#));
    }
}
