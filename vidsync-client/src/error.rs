//! Client error types

use serde::Deserialize;
use thiserror::Error;

/// Error body returned by the server
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    code: Option<String>,
}

/// Error type for dashboard API calls.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// The request never produced a response (connect, timeout, decode).
    #[error("Request failed: {0}")]
    Transport(String),

    /// The server answered with an error status.
    #[error("Server rejected request ({status}): {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Machine-readable code, when the server sent one
        code: Option<String>,
        /// Human-readable message
        message: String,
    },
}

impl ClientError {
    /// Build a rejection from a status and raw response body
    #[must_use]
    pub fn rejected(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => Self::Rejected {
                status,
                code: parsed.code,
                message: parsed.error,
            },
            Err(_) => Self::Rejected {
                status,
                code: None,
                message: if body.trim().is_empty() {
                    format!("HTTP {status}")
                } else {
                    body.trim().to_string()
                },
            },
        }
    }

    /// The server refused the anti-forgery secret or session
    #[must_use]
    pub const fn is_auth_rejection(&self) -> bool {
        matches!(self, Self::Rejected { status: 403, .. })
    }

    /// The upstream item does not exist
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Rejected { status: 404, .. })
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.without_url().to_string())
    }
}

/// The view task has stopped and no longer accepts signals.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("view has shut down")]
pub struct ViewClosed;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_parses_error_body() {
        let err = ClientError::rejected(403, r#"{"error":"Invalid CSRF token","code":"csrf_invalid"}"#);
        assert!(err.is_auth_rejection());
        assert!(!err.is_not_found());
        assert_eq!(
            err,
            ClientError::Rejected {
                status: 403,
                code: Some("csrf_invalid".to_string()),
                message: "Invalid CSRF token".to_string(),
            }
        );
    }

    #[test]
    fn test_rejected_falls_back_to_text() {
        let err = ClientError::rejected(502, "  bad gateway\n");
        assert_eq!(err.to_string(), "Server rejected request (502): bad gateway");

        let err = ClientError::rejected(404, "");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Server rejected request (404): HTTP 404");
    }

    #[test]
    fn test_transport_is_not_a_rejection() {
        let err = ClientError::Transport("connection refused".into());
        assert!(!err.is_auth_rejection());
        assert!(!err.is_not_found());
    }
}
