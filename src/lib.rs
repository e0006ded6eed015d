// ============================================================================
// Linting
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![warn(missing_docs)]                // Public items should be documented
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

#![warn(unused_imports)]              // Unused imports
#![warn(unused_variables)]            // Unused variables
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Pulumi Cloud Provider
//!
//! A resource provider that manages Pulumi Cloud objects (stacks, access
//! tokens, teams, webhooks and deployments) through the Pulumi Cloud REST API.
//!
//! ## Overview
//!
//! The host drives every resource through the same lifecycle: `check` new
//! inputs, `diff` them against recorded state, then `create`, `read`,
//! `update` or `delete`. The provider answers each call by talking to the
//! service and returning state as a tree of property values.
//!
//! ## Architecture
//!
//! 1. **Property values**: a tagged tree with secret and unknown markers
//! 2. **Codec**: typed records to and from property maps
//! 3. **Diff engine**: structural diff with replace escalation
//! 4. **Secret policy**: how secret inputs survive create, import and refresh
//! 5. **Deployments**: submit, stream logs, poll status
//!
//! ## Modules
//!
//! - [`property`]: Property value model and wire encoding
//! - [`codec`]: Record codecs
//! - [`diff`]: Structural diff
//! - [`secrets`]: Secret lifecycle policy
//! - [`flatten`]: Stack config flattening into `pulumi config set` commands
//! - [`deployment`]: Deployment executor
//! - [`api`]: REST client
//! - [`resources`]: Resource adapters and the [`Provider`] dispatcher
//! - [`config`]: Provider settings
//! - [`cli`]: Command-line harness
//!
//! ## Example
//!
//! ```json
//! {
//!   "urn": "urn:pulumi:dev::infra::pulumiservice:index:Team::devs",
//!   "olds": { "name": "devs", "members": ["alice"] },
//!   "news": { "name": "devs", "members": ["alice", "bob"] }
//! }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod api;
pub mod cli;
pub mod codec;
pub mod config;
pub mod deployment;
pub mod diff;
pub mod error;
pub mod flatten;
pub mod property;
pub mod resources;
pub mod secrets;

// ============================================================================
// Re-exports
// ============================================================================

pub use api::{ServiceApi, ServiceClient};
pub use codec::{FieldValue, PropertyRecord};
pub use config::{ConfigLoader, ConfigValidator, ProviderConfig};
pub use deployment::{Deadline, DeploymentExecutor, DeploymentRun};
pub use diff::{DiffEngine, DiffResponse, DiffResult};
pub use error::{ProviderError, Result};
pub use property::{PropertyMap, PropertyValue};
pub use resources::Provider;
