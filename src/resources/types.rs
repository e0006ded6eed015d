//! Request and response bodies exchanged with the host engine.
//!
//! Property maps use the wire encoding from [`crate::property::wire`].

use serde::{Deserialize, Serialize};

use crate::property::PropertyMap;

/// Validation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    /// Resource URN.
    pub urn: String,
    /// Previous inputs, if any.
    #[serde(default)]
    pub olds: PropertyMap,
    /// New inputs.
    #[serde(default)]
    pub news: PropertyMap,
}

/// One validation failure, scoped to a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckFailure {
    /// Offending property.
    pub property: String,
    /// What is wrong with it.
    pub reason: String,
}

impl CheckFailure {
    /// Creates a failure.
    #[must_use]
    pub fn new(property: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            reason: reason.into(),
        }
    }
}

/// Validation response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    /// Inputs to use for later calls.
    pub inputs: PropertyMap,
    /// Validation failures; empty when valid.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<CheckFailure>,
}

impl CheckResponse {
    /// Accepts `inputs` with the given failures.
    #[must_use]
    pub const fn new(inputs: PropertyMap, failures: Vec<CheckFailure>) -> Self {
        Self { inputs, failures }
    }
}

/// Diff request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffRequest {
    /// Resource URN.
    pub urn: String,
    /// Resource id.
    #[serde(default)]
    pub id: String,
    /// Inputs recorded at the last update.
    #[serde(default)]
    pub old_inputs: PropertyMap,
    /// State recorded at the last update.
    #[serde(default)]
    pub olds: PropertyMap,
    /// New inputs.
    #[serde(default)]
    pub news: PropertyMap,
    /// Top-level keys whose changes are ignored.
    #[serde(default)]
    pub ignore_changes: Vec<String>,
}

/// Create request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    /// Resource URN.
    pub urn: String,
    /// Checked inputs.
    #[serde(default)]
    pub properties: PropertyMap,
    /// Timeout in seconds; zero means none.
    #[serde(default)]
    pub timeout: f64,
}

/// Create response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponse {
    /// Id assigned to the new resource.
    pub id: String,
    /// Resulting state.
    pub properties: PropertyMap,
}

/// Read (refresh or import) request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadRequest {
    /// Resource URN.
    pub urn: String,
    /// Resource id.
    pub id: String,
    /// Recorded state; empty on import.
    #[serde(default)]
    pub properties: PropertyMap,
    /// Recorded inputs; empty on import.
    #[serde(default)]
    pub inputs: PropertyMap,
}

/// Read response. An empty `id` means the resource no longer exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadResponse {
    /// Resource id, or empty when gone.
    pub id: String,
    /// Observed state.
    #[serde(default)]
    pub properties: PropertyMap,
    /// Inputs reconstructed from the observed state.
    #[serde(default)]
    pub inputs: PropertyMap,
}

impl ReadResponse {
    /// The resource no longer exists.
    #[must_use]
    pub fn gone() -> Self {
        Self::default()
    }

    /// Returns true if the resource no longer exists.
    #[must_use]
    pub fn is_gone(&self) -> bool {
        self.id.is_empty()
    }
}

/// Update request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    /// Resource URN.
    pub urn: String,
    /// Resource id.
    pub id: String,
    /// Recorded state.
    #[serde(default)]
    pub olds: PropertyMap,
    /// New inputs.
    #[serde(default)]
    pub news: PropertyMap,
    /// Timeout in seconds; zero means none.
    #[serde(default)]
    pub timeout: f64,
}

/// Update response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
    /// Resulting state.
    pub properties: PropertyMap,
}

/// Delete request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    /// Resource URN.
    pub urn: String,
    /// Resource id.
    pub id: String,
    /// Recorded state.
    #[serde(default)]
    pub properties: PropertyMap,
    /// Timeout in seconds; zero means none.
    #[serde(default)]
    pub timeout: f64,
}

/// Function invocation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeRequest {
    /// Function token, e.g. `pulumiservice:index:RunDeployment`.
    #[serde(alias = "tok")]
    pub token: String,
    /// Arguments.
    #[serde(default)]
    pub args: PropertyMap,
}

/// Function invocation response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeResponse {
    /// Return value.
    #[serde(rename = "return")]
    pub properties: PropertyMap,
    /// Argument validation failures.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<CheckFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertyValue;
    use crate::property::wire::{SECRET_SIG, SIG_KEY};
    use serde_json::json;

    #[test]
    fn test_create_request_reads_wire_markers() {
        let request: CreateRequest = serde_json::from_value(json!({
            "urn": "urn:pulumi:dev::infra::pulumiservice:index:Webhook::hook",
            "properties": {
                "displayName": "hook",
                "secret": { SIG_KEY: SECRET_SIG, "value": "s3cr3t" }
            }
        }))
        .expect("decode");

        assert_eq!(request.timeout, 0.0);
        assert_eq!(request.properties["secret"], PropertyValue::secret("s3cr3t"));
    }

    #[test]
    fn test_invoke_response_uses_return_key() {
        let response = InvokeResponse {
            properties: PropertyMap::new().with("id", "d1"),
            failures: Vec::new(),
        };
        assert_eq!(serde_json::to_value(response).expect("encode"), json!({ "return": { "id": "d1" } }));
    }

    #[test]
    fn test_gone_read() {
        assert!(ReadResponse::gone().is_gone());
    }
}
