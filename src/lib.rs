//! Google Compute Engine client facade
//!
//! A thin async layer over the Compute Engine REST API covering image lookup,
//! instance lifecycle and zone operation polling. Every call maps to exactly one
//! HTTP round trip; authentication, timeouts and connection pooling belong to the
//! `reqwest::Client` handed in by the caller.

pub mod config;
pub mod gcp;

pub use gcp::client::ComputeClient;
pub use gcp::error::{ClientInitializationError, ProviderError};
pub use gcp::model::{Image, Instance, Operation, OperationStatus};
pub use gcp::service::ComputeService;
