//! Provider configuration.
//!
//! This module handles:
//! - The [`ProviderConfig`] settings and their defaults
//! - Loading from YAML, `.env`, environment variables and host variables
//! - Validation of configured values

mod parser;
mod provider_config;
mod validator;

pub use parser::{
    ConfigLoader, DEFAULT_CONFIG_FILES, ENV_ACCESS_TOKEN, ENV_BACKEND_URL, ENV_POLL_INTERVAL,
    ENV_PULUMI_HOME, ENV_REQUEST_TIMEOUT, HOST_VARIABLE_PREFIX, find_config_file, user_config_file,
};
pub use provider_config::{DEFAULT_POLL_INTERVAL_SECS, ProviderConfig};
pub use validator::{ConfigValidator, ValidationError};
