//! Pulumi Cloud REST API.
//!
//! [`ServiceApi`] is the seam every resource talks through; [`ServiceClient`]
//! is the reqwest-backed implementation.

mod client;
mod service;
pub mod types;

pub use client::{DEFAULT_SERVICE_URL, DEFAULT_TIMEOUT_SECS, ServiceClient};
#[cfg(test)]
pub use service::MockServiceApi;
pub use service::{ApiResult, ServiceApi};
pub use types::*;
