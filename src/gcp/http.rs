//! HTTP utilities for Compute REST API calls

use super::error::{ErrorDetail, ProviderError};
use reqwest::{Client, Request, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Query parameters the API expects on every call for compact JSON responses.
pub(crate) const RESPONSE_FORMAT: [(&str, &str); 2] = [("alt", "json"), ("prettyPrint", "false")];

/// Sanitize response body for logging
/// Truncates long responses and drops control characters
pub fn sanitize_for_log(body: &str) -> String {
    let total = body.chars().count();
    let cleaned: String = body
        .chars()
        .take(MAX_LOG_BODY_LENGTH)
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .collect();

    if total > MAX_LOG_BODY_LENGTH {
        format!("{}... [truncated, {} bytes total]", cleaned, body.len())
    } else {
        cleaned
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

/// Build a [`ProviderError`] from a non-success response.
///
/// Understands the `{"error": {"code", "message", "errors"}}` envelope; anything
/// else falls back to the trimmed body as sent, or the status reason phrase.
pub fn decode_error(status: StatusCode, body: &str) -> ProviderError {
    let (message, details) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => (envelope.error.message, envelope.error.errors),
        Err(_) => (None, Vec::new()),
    };

    let message = message
        .filter(|m| !m.is_empty())
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

    ProviderError::Status {
        status,
        message,
        details,
    }
}

/// Send one request and decode the JSON body into `T`.
///
/// Exactly one round trip; the caller's client owns auth headers, timeouts and pooling.
pub(crate) async fn send<T: DeserializeOwned>(client: &Client, request: Request) -> Result<T, ProviderError> {
    tracing::debug!("{} {}", request.method(), request.url());

    let response = client.execute(request).await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
        tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
        return Err(decode_error(status, &body));
    }

    serde_json::from_str(&body).map_err(|source| {
        tracing::error!("Undecodable response: {} - {}", status, sanitize_for_log(&body));
        ProviderError::Decode { status, source }
    })
}
