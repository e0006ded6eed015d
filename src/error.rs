//! Error types for the Pulumi Cloud provider.
//!
//! This module provides the error hierarchy for every layer of the provider:
//! configuration, the property codec, the REST client, deployment execution,
//! and resource operations.

use std::path::PathBuf;
use thiserror::Error;

use crate::deployment::DeploymentRun;
use crate::property::PropertyMap;

/// The main error type for the provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Configuration-related errors.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Property encoding and decoding errors.
    #[error(transparent)]
    Property(#[from] PropertyError),

    /// REST API errors.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Deployment execution errors.
    #[error(transparent)]
    Deployment(#[from] DeploymentError),

    /// A local operation failed; the remote message is kept verbatim.
    #[error("failed to {context}: {source}")]
    Operation {
        /// The local operation, e.g. "create access token".
        context: String,
        /// The underlying failure.
        #[source]
        source: Box<ProviderError>,
    },

    /// The primary object exists remotely but a later step failed.
    #[error("resource '{id}' initialization failed: {}", reasons.join("; "))]
    InitFailed {
        /// Identifier assigned to the created object.
        id: String,
        /// State observed so far.
        properties: PropertyMap,
        /// Why initialization did not complete.
        reasons: Vec<String>,
    },

    /// The URN names a resource type this provider does not manage.
    #[error("unknown resource type '{0}'")]
    UnknownResource(String),

    /// The invoke token names no known function.
    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    /// The host called an operation this resource type never expects.
    #[error("unexpected call to {operation} for {resource}")]
    Unsupported {
        /// The operation, e.g. "update".
        operation: &'static str,
        /// Resource type token.
        resource: &'static str,
    },

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors at the host boundary.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// No access token was configured.
    #[error("missing access token: set PULUMI_ACCESS_TOKEN or pulumiservice:config:accessToken")]
    MissingAccessToken,
}

/// Errors converting between typed records and property values.
#[derive(Debug, Error)]
pub enum PropertyError {
    /// The wire value's tag does not fit the target field.
    #[error("field type {field_kind:?} does not match property {field:?} of kind {wire_kind:?}")]
    FieldTypeMismatch {
        /// Wire name of the field.
        field: String,
        /// Kind found on the wire.
        wire_kind: &'static str,
        /// Kind the field expects.
        field_kind: &'static str,
    },

    /// A required property is absent.
    #[error("missing required property '{property}'")]
    MissingRequiredProperty {
        /// Wire name of the property.
        property: String,
    },

    /// A composite identifier does not have the expected shape.
    #[error("invalid {kind} id '{value}'")]
    InvalidIdentifierFormat {
        /// Which identifier was being parsed.
        kind: &'static str,
        /// The rejected value.
        value: String,
    },

    /// A JSON value could not be read as a property value.
    #[error("invalid property value: {message}")]
    InvalidWireValue {
        /// Description of the problem.
        message: String,
    },
}

/// REST API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, TLS, or timeout failure. Never retried.
    #[error("transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The service answered with a non-2xx status.
    #[error("{status} API error: {message}")]
    Status {
        /// HTTP status code (or the code from the error body).
        status: u16,
        /// Message from the service's error body.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("invalid response from service: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },
}

/// Deployment execution errors. Every variant raised after submission carries
/// the partial run observed so far.
#[derive(Debug, Error)]
pub enum DeploymentError {
    /// The caller deadline elapsed, before submission or while polling.
    #[error("{}", deadline_message(.run.as_deref()))]
    DeadlineExceeded {
        /// Partial run state; `None` when nothing was submitted.
        run: Option<Box<DeploymentRun>>,
    },

    /// The create-deployment request failed; no run exists.
    #[error(transparent)]
    Submit(ApiError),

    /// The remote run finished with status "failed".
    #[error("deployment {} failed", run.id)]
    Failed {
        /// Partial run state.
        run: Box<DeploymentRun>,
    },

    /// The remote run reported a status this provider does not recognize.
    #[error("unexpected deployment status '{status}' for deployment {}", run.id)]
    UnexpectedRemoteStatus {
        /// The unrecognized status string.
        status: String,
        /// Partial run state.
        run: Box<DeploymentRun>,
    },

    /// A request made while polling failed.
    #[error("deployment {} polling failed: {source}", run.id)]
    Poll {
        /// Partial run state.
        run: Box<DeploymentRun>,
        /// The request failure.
        #[source]
        source: ApiError,
    },
}

/// Result type alias for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

impl ProviderError {
    /// Wraps an error with the local operation that triggered it.
    #[must_use]
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Operation {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Returns true if this error is a 404 from the service.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Api(ApiError::Status { status: 404, .. }))
    }

    /// Returns the partial deployment run carried by this error, if any.
    #[must_use]
    pub fn partial_run(&self) -> Option<&DeploymentRun> {
        match self {
            Self::Deployment(e) => e.run(),
            Self::Operation { source, .. } => source.partial_run(),
            _ => None,
        }
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

impl PropertyError {
    /// Creates a field type mismatch error.
    #[must_use]
    pub fn mismatch(field: impl Into<String>, wire_kind: &'static str, field_kind: &'static str) -> Self {
        Self::FieldTypeMismatch {
            field: field.into(),
            wire_kind,
            field_kind,
        }
    }

    /// Creates a missing property error.
    #[must_use]
    pub fn missing(property: impl Into<String>) -> Self {
        Self::MissingRequiredProperty {
            property: property.into(),
        }
    }

    /// Creates an identifier format error.
    #[must_use]
    pub fn invalid_id(kind: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidIdentifierFormat {
            kind,
            value: value.into(),
        }
    }
}

impl ApiError {
    /// Creates a status error.
    #[must_use]
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Creates a transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

impl DeploymentError {
    /// The partial run carried by this error, if one was submitted.
    #[must_use]
    pub fn run(&self) -> Option<&DeploymentRun> {
        match self {
            Self::DeadlineExceeded { run } => run.as_deref(),
            Self::Failed { run }
            | Self::UnexpectedRemoteStatus { run, .. }
            | Self::Poll { run, .. } => Some(run),
            Self::Submit(_) => None,
        }
    }
}

fn deadline_message(run: Option<&DeploymentRun>) -> String {
    match run {
        Some(run) => format!("deployment {} did not finish before the deadline", run.id),
        None => String::from("deadline elapsed before the deployment was submitted"),
    }
}
