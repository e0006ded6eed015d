//! Validation of provider settings.

use tracing::debug;
use validator::{Validate, ValidationErrors};

use crate::error::{ConfigError, ProviderError, Result};

use super::provider_config::ProviderConfig;

/// A single validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

/// Validator for provider settings.
#[derive(Debug, Default)]
pub struct ConfigValidator {
    /// Whether a missing access token is an error.
    require_token: bool,
}

impl ConfigValidator {
    /// Creates a validator that checks field ranges only.
    #[must_use]
    pub const fn new() -> Self {
        Self { require_token: false }
    }

    /// Also requires an access token.
    #[must_use]
    pub const fn require_token(mut self) -> Self {
        self.require_token = true;
        self
    }

    /// Collects every field error, sorted by field name.
    #[must_use]
    pub fn errors(config: &ProviderConfig) -> Vec<ValidationError> {
        config.validate().map_or_else(|e| flatten_errors(&e), |()| Vec::new())
    }

    /// Validates `config`, reporting the first failure.
    ///
    /// # Errors
    ///
    /// Returns an error if a field is out of range or, when required, the
    /// token is missing.
    pub fn validate(&self, config: &ProviderConfig) -> Result<()> {
        if let Some(first) = Self::errors(config).into_iter().next() {
            return Err(ProviderError::Config(ConfigError::validation(
                format!("{}: {}", first.field, first.message),
                first.field,
            )));
        }
        if self.require_token {
            config.access_token()?;
        }
        debug!("Provider configuration validation passed");
        Ok(())
    }
}

fn flatten_errors(errors: &ValidationErrors) -> Vec<ValidationError> {
    let mut flat: Vec<ValidationError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| ValidationError {
                field: field.to_string(),
                message: e
                    .message
                    .as_ref()
                    .map_or_else(|| e.code.to_string(), ToString::to_string),
            })
        })
        .collect();
    flat.sort_by(|a, b| a.field.cmp(&b.field));
    flat
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ProviderConfig {
        ProviderConfig {
            access_token: Some(String::from("pul-abc")),
            ..ProviderConfig::default()
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(ConfigValidator::new().require_token().validate(&valid()).is_ok());
    }

    #[test]
    fn test_bad_url_is_reported() {
        let config = ProviderConfig {
            service_url: String::from("not a url"),
            ..valid()
        };
        let errors = ConfigValidator::errors(&config);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "service_url");
        assert_eq!(errors[0].message, "must be an absolute URL");
    }

    #[test]
    fn test_errors_are_sorted() {
        let config = ProviderConfig {
            request_timeout_secs: 0,
            poll_interval_secs: 0,
            ..valid()
        };
        let fields: Vec<_> = ConfigValidator::errors(&config).into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["poll_interval_secs", "request_timeout_secs"]);
    }

    #[test]
    fn test_missing_token_only_when_required() {
        let config = ProviderConfig::default();
        assert!(ConfigValidator::new().validate(&config).is_ok());
        let err = ConfigValidator::new().require_token().validate(&config).expect_err("token");
        assert!(matches!(err, ProviderError::Config(ConfigError::MissingAccessToken)));
    }
}
