//! Provider settings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use validator::Validate;

use crate::api::{DEFAULT_SERVICE_URL, DEFAULT_TIMEOUT_SECS};
use crate::error::ConfigError;

/// Default pause between deployment status polls, in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;

/// Settings the provider needs to talk to the service.
///
/// Every field has a default except the access token, which must come from
/// the environment, the host, a config file, or stored CLI credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ProviderConfig {
    /// Pulumi Cloud access token.
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    /// Base URL of the service API.
    #[validate(url(message = "must be an absolute URL"))]
    pub service_url: String,
    /// Per-request timeout in seconds.
    #[validate(range(min = 1, max = 3600, message = "must be between 1 and 3600 seconds"))]
    pub request_timeout_secs: u64,
    /// Pause between deployment status polls in seconds.
    #[validate(range(min = 1, max = 300, message = "must be between 1 and 300 seconds"))]
    pub poll_interval_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            service_url: DEFAULT_SERVICE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl ProviderConfig {
    /// The configured access token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingAccessToken`] when no token is set.
    pub fn access_token(&self) -> Result<&str, ConfigError> {
        self.access_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .ok_or(ConfigError::MissingAccessToken)
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Pause between deployment status polls.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

// The token never reaches logs.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("service_url", &self.service_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .finish()
    }
}
