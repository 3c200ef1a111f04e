//! Error types for the Firefly III client.
//!
//! # Design
//! Every failure the engine can surface is one `ClientError` variant. Callers
//! branch on `kind()` and `status()` rather than matching variants directly:
//! an API error carries the HTTP status and the server's decoded error body,
//! while network-level failures (including timeouts) carry no status at all.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error envelope returned by the Firefly III API on non-2xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
    /// Validation messages keyed by field name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

impl ErrorBody {
    /// Flatten field errors into `field: message` lines.
    pub fn field_messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .flatten()
            .flat_map(|(field, messages)| messages.iter().map(move |m| format!("{field}: {m}")))
            .collect()
    }
}

/// Coarse classification of a `ClientError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No HTTP response was obtained.
    Network,
    /// The server answered with a non-2xx status.
    Api,
    /// A 2xx body did not decode into the expected shape.
    Decode,
    /// The request could not be built; nothing was sent.
    InvalidRequest,
}

/// Errors returned by `Engine::execute` and the typed accessors.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Connection refused, DNS failure, or a broken transfer.
    #[error("network error: {message}")]
    Network { message: String },

    /// The attempt did not complete within the configured timeout.
    #[error("request timed out after {}ms", .after.as_millis())]
    Timeout { after: Duration },

    /// The server returned a non-2xx status.
    #[error("API error {status}: {message}")]
    Api {
        status: u16,
        message: String,
        detail: Option<ErrorBody>,
    },

    #[error("failed to decode response: {message}")]
    Decode { message: String },

    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("request failed after exhausting all retries")]
    RetriesExhausted,
}

impl ClientError {
    pub fn network(err: impl std::fmt::Display) -> Self {
        ClientError::Network {
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Network { .. } | ClientError::Timeout { .. } | ClientError::RetriesExhausted => {
                ErrorKind::Network
            }
            ClientError::Api { .. } => ErrorKind::Api,
            ClientError::Decode { .. } => ErrorKind::Decode,
            ClientError::InvalidRequest { .. } => ErrorKind::InvalidRequest,
        }
    }

    /// HTTP status for API errors, `None` for everything else.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_api(&self) -> bool {
        self.kind() == ErrorKind::Api
    }

    /// Client errors (4xx) are final; a request that cannot be built never
    /// reaches the loop. Everything else may succeed on another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Api { status, .. } => !(400..500).contains(status),
            ClientError::InvalidRequest { .. } => false,
            _ => true,
        }
    }

    /// Structured server detail, when the error body decoded.
    pub fn detail(&self) -> Option<&ErrorBody> {
        match self {
            ClientError::Api { detail, .. } => detail.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> ClientError {
        ClientError::Api {
            status,
            message: "boom".to_string(),
            detail: None,
        }
    }

    #[test]
    fn client_errors_are_not_retryable() {
        for status in [400, 401, 403, 404, 422, 429, 499] {
            assert!(!api(status).is_retryable(), "{status}");
        }
    }

    #[test]
    fn server_and_network_errors_are_retryable() {
        assert!(api(500).is_retryable());
        assert!(api(503).is_retryable());
        assert!(ClientError::network("connection refused").is_retryable());
        assert!(ClientError::Timeout {
            after: Duration::from_secs(1)
        }
        .is_retryable());
        assert!(ClientError::Decode {
            message: "eof".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn status_only_for_api_errors() {
        assert_eq!(api(403).status(), Some(403));
        assert!(api(503).is_api());
        assert_eq!(ClientError::network("dns").status(), None);
        assert!(!ClientError::network("dns").is_api());
        assert_eq!(ClientError::network("dns").kind(), ErrorKind::Network);
        assert_eq!(
            ClientError::Timeout {
                after: Duration::from_millis(5)
            }
            .kind(),
            ErrorKind::Network
        );
    }

    #[test]
    fn timeout_display_uses_milliseconds() {
        let err = ClientError::Timeout {
            after: Duration::from_millis(1500),
        };
        assert_eq!(err.to_string(), "request timed out after 1500ms");
    }

    #[test]
    fn error_body_decodes_validation_errors() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"message":"The given data was invalid.","errors":{"name":["This name is already in use."]}}"#,
        )
        .unwrap();
        assert_eq!(body.message, "The given data was invalid.");
        assert!(body.exception.is_none());
        assert_eq!(body.field_messages(), vec!["name: This name is already in use."]);
    }

    #[test]
    fn error_body_requires_message() {
        assert!(serde_json::from_str::<ErrorBody>(r#"{"exception":"X"}"#).is_err());
    }
}
