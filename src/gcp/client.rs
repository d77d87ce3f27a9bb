//! Compute Client
//!
//! REST-backed [`ComputeService`]. Binds a caller-supplied `reqwest::Client` to
//! the Compute Engine v1 endpoint, or to an override host that keeps the
//! endpoint's path prefix.

use super::error::{ClientInitializationError, ProviderError};
use super::http::{self, RESPONSE_FORMAT};
use super::model::{Image, Instance, Operation};
use super::service::ComputeService;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

/// Production endpoint of the Compute Engine v1 API.
pub const DEFAULT_BASE_URL: &str = "https://compute.googleapis.com/compute/v1/";

/// Compute Engine facade over a pre-authenticated HTTP client
#[derive(Debug, Clone)]
pub struct ComputeClient {
    http: Client,
    /// Always ends with `/`
    base_url: String,
}

fn parse_base_url(raw: &str) -> Result<Url, ClientInitializationError> {
    let url = Url::parse(raw).map_err(|source| ClientInitializationError::InvalidBaseUrl {
        url: raw.to_string(),
        source,
    })?;

    if url.cannot_be_a_base()
        || !matches!(url.scheme(), "http" | "https")
        || url.query().is_some()
        || url.fragment().is_some()
    {
        return Err(ClientInitializationError::UnsupportedBaseUrl {
            url: raw.to_string(),
        });
    }

    Ok(url)
}

impl ComputeClient {
    /// Create a client for the production endpoint.
    ///
    /// `http` must already carry credentials (e.g. a default `Authorization` header);
    /// see [`auth::authorized_client`](super::auth::authorized_client).
    pub fn new(http: Client) -> Result<Self, ClientInitializationError> {
        let base = parse_base_url(DEFAULT_BASE_URL)?;
        Ok(Self {
            http,
            base_url: base.to_string(),
        })
    }

    /// Create a client whose requests go to `base_url` instead of the production host.
    ///
    /// Scheme, host and port come from `base_url`; the production path prefix
    /// (`/compute/v1/`) is appended to it, so `http://127.0.0.1:8080` becomes
    /// `http://127.0.0.1:8080/compute/v1/`.
    pub fn with_base_url(http: Client, base_url: &str) -> Result<Self, ClientInitializationError> {
        let default = parse_base_url(DEFAULT_BASE_URL)?;
        let host = parse_base_url(base_url)?;

        let rewritten = format!("{}{}", host.as_str().trim_end_matches('/'), default.path());
        let base = parse_base_url(&rewritten)?;

        tracing::info!("Compute API base URL overridden: {}", base);

        Ok(Self {
            http,
            base_url: base.to_string(),
        })
    }

    /// Effective base URL every request is built from
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =========================================================================
    // URL helpers
    // =========================================================================

    /// Build a project-scoped URL; `path` must already be encoded
    fn compute_url(&self, project: &str, path: &str) -> String {
        format!("{}projects/{}/{}", self.base_url, urlencoding::encode(project), path)
    }

    /// Build a zonal URL for `resource` (already encoded)
    fn compute_zonal_url(&self, project: &str, zone: &str, resource: &str) -> String {
        self.compute_url(project, &format!("zones/{}/{}", urlencoding::encode(zone), resource))
    }

    /// Build a global URL for `resource` (already encoded)
    fn compute_global_url(&self, project: &str, resource: &str) -> String {
        self.compute_url(project, &format!("global/{}", resource))
    }

    fn instance_url(&self, project: &str, zone: &str, instance: &str) -> String {
        self.compute_zonal_url(project, zone, &format!("instances/{}", urlencoding::encode(instance)))
    }

    // =========================================================================
    // Requests
    // =========================================================================

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, ProviderError> {
        let request = self.http.get(url).query(&RESPONSE_FORMAT).build()?;
        http::send(&self.http, request).await
    }

    async fn post<T: DeserializeOwned>(&self, url: &str, body: &Instance) -> Result<T, ProviderError> {
        let request = self.http.post(url).query(&RESPONSE_FORMAT).json(body).build()?;
        http::send(&self.http, request).await
    }

    async fn delete<T: DeserializeOwned>(&self, url: &str) -> Result<T, ProviderError> {
        let request = self.http.delete(url).query(&RESPONSE_FORMAT).build()?;
        http::send(&self.http, request).await
    }
}

#[async_trait]
impl ComputeService for ComputeClient {
    async fn images_get(&self, project: &str, image: &str) -> Result<Image, ProviderError> {
        let url = self.compute_global_url(project, &format!("images/{}", urlencoding::encode(image)));
        self.get(&url).await
    }

    async fn images_get_from_family(&self, project: &str, family: &str) -> Result<Image, ProviderError> {
        let url = self.compute_global_url(project, &format!("images/family/{}", urlencoding::encode(family)));
        self.get(&url).await
    }

    async fn instances_delete(&self, project: &str, zone: &str, instance: &str) -> Result<Operation, ProviderError> {
        let url = self.instance_url(project, zone, instance);
        self.delete(&url).await
    }

    async fn instances_get(&self, project: &str, zone: &str, instance: &str) -> Result<Instance, ProviderError> {
        let url = self.instance_url(project, zone, instance);
        self.get(&url).await
    }

    async fn instances_insert(&self, project: &str, zone: &str, instance: &Instance) -> Result<Operation, ProviderError> {
        let url = self.compute_zonal_url(project, zone, "instances");
        self.post(&url, instance).await
    }

    async fn zone_operations_get(&self, project: &str, zone: &str, operation: &str) -> Result<Operation, ProviderError> {
        let url = self.compute_zonal_url(project, zone, &format!("operations/{}", urlencoding::encode(operation)));
        self.get(&url).await
    }
}
