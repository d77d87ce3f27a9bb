//! Compute facade errors
//!
//! Construction problems surface once as [`ClientInitializationError`]; every
//! API call reports failures as a [`ProviderError`]. Neither is retried or
//! recovered from inside the facade.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Raised when a [`ComputeClient`](super::client::ComputeClient) cannot be built.
#[derive(Debug, Error)]
pub enum ClientInitializationError {
    /// The base URL (default endpoint or override) did not parse.
    #[error("invalid base URL {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    /// The override parsed but cannot host the API path (e.g. `mailto:`, `file:`,
    /// or a URL carrying a query or fragment).
    #[error("base URL {url:?} must be an http or https URL without query or fragment")]
    UnsupportedBaseUrl { url: String },
}

/// A single entry from the provider's `error.errors[]` list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Failure of a single Compute API call.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider answered with a non-success status.
    #[error("compute API returned {status}: {message}")]
    Status {
        status: StatusCode,
        message: String,
        details: Vec<ErrorDetail>,
    },
    /// No usable response: connection, TLS, timeout or body read failure.
    #[error("compute API request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// A success response whose body is not the expected resource.
    #[error("failed to decode compute API response ({status}): {source}")]
    Decode {
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },
}

impl ProviderError {
    /// HTTP status reported by the provider, if a response was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } | Self::Decode { status, .. } => Some(*status),
            Self::Transport(err) => err.status(),
        }
    }

    /// Provider message (or the underlying failure description).
    pub fn message(&self) -> String {
        match self {
            Self::Status { message, .. } => message.clone(),
            Self::Transport(err) => err.to_string(),
            Self::Decode { source, .. } => source.to_string(),
        }
    }

    /// Structured reasons attached by the provider.
    pub fn details(&self) -> &[ErrorDetail] {
        match self {
            Self::Status { details, .. } => details.as_slice(),
            _ => &[],
        }
    }

    /// The addressed resource (image, family, instance, operation) does not exist.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// The request was rejected as malformed, typically an invalid instance document.
    pub fn is_invalid_request(&self) -> bool {
        self.status() == Some(StatusCode::BAD_REQUEST)
    }

    /// Short remedy suitable for showing to a person at a terminal.
    pub fn hint(&self) -> Option<&'static str> {
        let status = self.status()?;
        let hint = match status.as_u16() {
            400 => "Invalid request. Check the resource names and the instance document.",
            401 => "Authentication failed. Run 'gcloud auth application-default login'.",
            403 => "Permission denied. Check your GCP IAM permissions.",
            404 => "Resource not found.",
            409 => "Resource conflict. The resource may already exist or be in use.",
            429 => "Rate limit exceeded. Please try again later.",
            code if (500..600).contains(&code) => {
                "GCP service temporarily unavailable. Please try again."
            }
            _ => return None,
        };
        Some(hint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_error(code: u16) -> ProviderError {
        ProviderError::Status {
            status: StatusCode::from_u16(code).unwrap(),
            message: "boom".to_string(),
            details: Vec::new(),
        }
    }

    #[test]
    fn test_classification() {
        assert!(status_error(404).is_not_found());
        assert!(!status_error(404).is_invalid_request());
        assert!(status_error(400).is_invalid_request());
        assert_eq!(status_error(503).status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    }

    #[test]
    fn test_hints() {
        assert_eq!(status_error(404).hint(), Some("Resource not found."));
        assert!(status_error(502).hint().unwrap().contains("temporarily unavailable"));
        assert_eq!(status_error(418).hint(), None);
    }

    #[test]
    fn test_display_includes_status_and_message() {
        let rendered = status_error(403).to_string();
        assert!(rendered.contains("403"));
        assert!(rendered.contains("boom"));
    }

    #[test]
    fn test_decode_error_keeps_status() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ProviderError::Decode {
            status: StatusCode::OK,
            source,
        };
        assert_eq!(err.status(), Some(StatusCode::OK));
        assert!(err.details().is_empty());
    }
}
