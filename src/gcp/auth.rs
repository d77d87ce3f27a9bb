//! GCP Authentication
//!
//! Builds the authenticated transport handed to
//! [`ComputeClient`](super::client::ComputeClient). The facade never touches
//! credentials itself: whatever `Authorization` header the client carries is
//! what the provider sees.

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;

/// Default scopes for GCP API access
pub const DEFAULT_SCOPES: &[&str] = &["https://www.googleapis.com/auth/cloud-platform"];

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("gce-compute/", env!("CARGO_PKG_VERSION"));

/// Build an HTTP client authenticated with Application Default Credentials
///
/// The access token is fetched once; the client is meant for short-lived,
/// command-scoped use.
pub async fn authorized_client() -> Result<Client> {
    let provider = gcp_auth::provider().await.context(
        "Failed to initialize GCP authentication. Run 'gcloud auth application-default login'",
    )?;

    let token = provider
        .token(DEFAULT_SCOPES)
        .await
        .context("Failed to get access token")?;

    tracing::debug!("Access token acquired for {} scope(s)", DEFAULT_SCOPES.len());

    client_with_token(token.as_str())
}

/// Build an HTTP client that sends `token` as a bearer credential
pub fn client_with_token(token: &str) -> Result<Client> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
        .context("Access token contains characters not allowed in a header")?;
    // Security: keep the token out of Debug output and HTTP/2 header tables
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);

    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()
        .context("Failed to create HTTP client")
}

/// Build an HTTP client without credentials, for emulators and stub servers
pub fn anonymous_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to create HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_with_token() {
        assert!(client_with_token("ya29.a0AfH6SMB").is_ok());
    }

    #[test]
    fn test_token_with_newline_is_rejected() {
        assert!(client_with_token("abc\ndef").is_err());
    }

    #[test]
    fn test_user_agent_carries_version() {
        assert!(USER_AGENT.starts_with("gce-compute/"));
    }
}
