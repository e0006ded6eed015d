//! Resource adapters and the provider that dispatches to them.
//!
//! Each adapter translates host operations on one resource type into REST
//! calls, using the codec for state, the diff engine for change detection and
//! the secret policy for secret fields.

mod access_token;
mod deployment;
mod invoke;
mod provider;
mod resource;
mod stack;
mod team;
pub mod types;
mod urn;
mod webhook;

pub use access_token::AccessTokenResource;
pub use deployment::{DEFAULT_POLL_INTERVAL, DeploymentResource};
pub use invoke::RunDeploymentFunction;
pub use provider::Provider;
pub use resource::{Function, LEGACY_INPUTS_KEY, Resource, lift_legacy_inputs};
pub use stack::StackResource;
pub use team::TeamResource;
pub use types::*;
pub use urn::Urn;
pub use webhook::WebhookResource;
