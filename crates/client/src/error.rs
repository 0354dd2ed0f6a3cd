//! Client error types

use thiserror::Error;

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Session storage failure
    #[error("Storage error: {0}")]
    Storage(#[from] dailyfeed_core::CoreError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Create error from HTTP status code
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        match status.as_u16() {
            400 => Self::BadRequest(message),
            401 => Self::AuthenticationFailed(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            _ => Self::ServerError {
                status: status.as_u16(),
                message,
            },
        }
    }
}

/// Pull a human-readable message out of a backend error body, trying the
/// field names the services actually use.
pub(crate) fn api_error_message(body: &serde_json::Value, status: reqwest::StatusCode) -> String {
    body.get("message")
        .and_then(|v| v.as_str())
        .or_else(|| body.get("error").and_then(|v| v.as_str()))
        .or_else(|| body.get("data").and_then(|v| v.as_str()))
        .map(str::to_string)
        .unwrap_or_else(|| format!("API call failed: {status}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_status_maps_common_codes() {
        assert!(matches!(
            ClientError::from_status(reqwest::StatusCode::UNAUTHORIZED, "x".into()),
            ClientError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            ClientError::from_status(reqwest::StatusCode::NOT_FOUND, "x".into()),
            ClientError::NotFound(_)
        ));
        assert!(matches!(
            ClientError::from_status(reqwest::StatusCode::BAD_GATEWAY, "x".into()),
            ClientError::ServerError { status: 502, .. }
        ));
    }

    #[test]
    fn error_message_falls_through_body_fields() {
        let status = reqwest::StatusCode::INTERNAL_SERVER_ERROR;
        assert_eq!(
            api_error_message(&json!({"message": "boom"}), status),
            "boom"
        );
        assert_eq!(
            api_error_message(&json!({"error": "bad"}), status),
            "bad"
        );
        assert_eq!(
            api_error_message(&json!({"data": "denied"}), status),
            "denied"
        );
        assert_eq!(
            api_error_message(&json!({}), status),
            "API call failed: 500 Internal Server Error"
        );
    }
}
