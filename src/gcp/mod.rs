//! GCP API interaction module
//!
//! This module provides the Compute Engine facade and the pieces it is built from.
//!
//! # Module Structure
//!
//! - [`auth`] - Authenticated transport from Application Default Credentials
//! - [`client`] - [`ComputeClient`](client::ComputeClient), the REST-backed facade
//! - [`error`] - Construction and per-call error types
//! - [`http`] - Request execution and error body decoding
//! - [`model`] - Images, instances and operations as returned by the API
//! - [`service`] - The [`ComputeService`](service::ComputeService) capability trait
//!
//! # Example
//!
//! ```ignore
//! use gce_compute::gcp::{auth, client::ComputeClient, service::ComputeService};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let http = auth::authorized_client().await?;
//!     let compute = ComputeClient::new(http)?;
//!     let image = compute.images_get_from_family("debian-cloud", "debian-12").await?;
//!     println!("{:?}", image.name);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod model;
pub mod service;
