//! Resource and function seams.

use async_trait::async_trait;

use crate::api::ServiceApi;
use crate::error::Result;
use crate::property::{PropertyMap, PropertyValue};

use super::types::{
    CheckRequest, CheckResponse, CreateRequest, CreateResponse, DeleteRequest, DiffRequest,
    InvokeResponse, ReadRequest, ReadResponse, UpdateRequest, UpdateResponse,
};
use crate::diff::DiffResponse;

/// Key under which older state recorded its inputs.
pub const LEGACY_INPUTS_KEY: &str = "__inputs";

/// One resource type managed by the provider.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Type token, e.g. `pulumiservice:index:Team`.
    fn type_token(&self) -> &'static str;

    /// Validates new inputs. Accepts them unchanged by default.
    async fn check(&self, request: CheckRequest) -> Result<CheckResponse> {
        Ok(CheckResponse::new(request.news, Vec::new()))
    }

    /// Computes the changes between recorded state and new inputs.
    async fn diff(&self, request: DiffRequest) -> Result<DiffResponse>;

    /// Creates the remote object.
    async fn create(&self, api: &dyn ServiceApi, request: CreateRequest) -> Result<CreateResponse>;

    /// Reads the remote object.
    async fn read(&self, api: &dyn ServiceApi, request: ReadRequest) -> Result<ReadResponse>;

    /// Updates the remote object in place.
    async fn update(&self, api: &dyn ServiceApi, request: UpdateRequest) -> Result<UpdateResponse>;

    /// Deletes the remote object.
    async fn delete(&self, api: &dyn ServiceApi, request: DeleteRequest) -> Result<()>;
}

/// A provider function callable through invoke.
#[async_trait]
pub trait Function: Send + Sync {
    /// Function token, e.g. `pulumiservice:index:RunDeployment`.
    fn token(&self) -> &'static str;

    /// Runs the function.
    async fn invoke(&self, api: &dyn ServiceApi, args: PropertyMap) -> Result<InvokeResponse>;
}

/// Lifts inputs recorded under [`LEGACY_INPUTS_KEY`] to the top level.
#[must_use]
pub fn lift_legacy_inputs(state: &PropertyMap) -> PropertyMap {
    let mut lifted = state.clone();
    if let Some(PropertyValue::Object(inputs)) = lifted.remove(LEGACY_INPUTS_KEY) {
        lifted.extend(inputs);
    }
    lifted
}

/// Returns true if `key` holds a usable value.
pub(crate) fn has_value(map: &PropertyMap, key: &str) -> bool {
    map.get(key).is_some_and(PropertyValue::has_value)
}
