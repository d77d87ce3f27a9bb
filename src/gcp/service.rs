//! Compute capability trait
//!
//! Callers depend on [`ComputeService`] rather than on the REST client so that
//! tests and higher layers can substitute their own implementation.

use super::error::ProviderError;
use super::model::{Image, Instance, Operation};
use async_trait::async_trait;

/// The Compute Engine calls this crate exposes.
///
/// Each method is a single request to the provider. Results are returned as the
/// provider sent them; failures come back as [`ProviderError`] without retries.
#[async_trait]
pub trait ComputeService: Send + Sync {
    /// Look up an image by name.
    async fn images_get(&self, project: &str, image: &str) -> Result<Image, ProviderError>;

    /// Resolve the newest non-deprecated image in a family.
    async fn images_get_from_family(&self, project: &str, family: &str) -> Result<Image, ProviderError>;

    /// Start deleting an instance. The returned operation is still in progress.
    async fn instances_delete(&self, project: &str, zone: &str, instance: &str) -> Result<Operation, ProviderError>;

    /// Fetch the current state of an instance.
    async fn instances_get(&self, project: &str, zone: &str, instance: &str) -> Result<Instance, ProviderError>;

    /// Start creating an instance from `instance`. The returned operation is still in progress.
    async fn instances_insert(&self, project: &str, zone: &str, instance: &Instance) -> Result<Operation, ProviderError>;

    /// Snapshot a zonal operation, e.g. one returned by insert or delete.
    async fn zone_operations_get(&self, project: &str, zone: &str, operation: &str) -> Result<Operation, ProviderError>;
}
