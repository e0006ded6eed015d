//! Provider entry point: routes host operations to resource adapters.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::api::{ServiceApi, ServiceClient};
use crate::config::ProviderConfig;
use crate::diff::DiffResponse;
use crate::error::{ProviderError, Result};

use super::access_token::AccessTokenResource;
use super::deployment::DeploymentResource;
use super::invoke::RunDeploymentFunction;
use super::resource::{Function, Resource};
use super::stack::StackResource;
use super::team::TeamResource;
use super::types::{
    CheckRequest, CheckResponse, CreateRequest, CreateResponse, DeleteRequest, DiffRequest,
    InvokeRequest, InvokeResponse, ReadRequest, ReadResponse, UpdateRequest, UpdateResponse,
};
use super::urn::Urn;
use super::webhook::WebhookResource;

/// The Pulumi Cloud resource provider.
pub struct Provider {
    /// Service client shared by every operation.
    api: Arc<dyn ServiceApi>,
    /// Resource adapters by type token.
    resources: BTreeMap<&'static str, Box<dyn Resource>>,
    /// Functions by token.
    functions: BTreeMap<&'static str, Box<dyn Function>>,
}

impl Provider {
    /// Creates a provider over `api`, polling deployments every `poll_interval`.
    #[must_use]
    pub fn new(api: Arc<dyn ServiceApi>, poll_interval: Duration) -> Self {
        let resources: Vec<Box<dyn Resource>> = vec![
            Box::new(StackResource),
            Box::new(AccessTokenResource),
            Box::new(TeamResource),
            Box::new(WebhookResource),
            Box::new(DeploymentResource::new(poll_interval)),
        ];
        let functions: Vec<Box<dyn Function>> = vec![Box::new(RunDeploymentFunction)];

        Self {
            api,
            resources: resources.into_iter().map(|r| (r.type_token(), r)).collect(),
            functions: functions.into_iter().map(|f| (f.token(), f)).collect(),
        }
    }

    /// Builds a provider talking to the service described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if no access token is configured or the HTTP client
    /// cannot be created.
    pub fn configure(config: &ProviderConfig) -> Result<Self> {
        let client = ServiceClient::with_timeout(
            config.access_token()?,
            &config.service_url,
            config.request_timeout(),
        )?;
        info!("Configured provider for {}", client.base_url());
        Ok(Self::new(Arc::new(client), config.poll_interval()))
    }

    /// Type tokens of every managed resource.
    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }

    /// Tokens of every function.
    pub fn function_tokens(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.functions.keys().copied()
    }

    fn resource(&self, urn: &str) -> Result<&dyn Resource> {
        let urn: Urn = urn.parse()?;
        self.resources
            .get(urn.type_token())
            .map(|resource| &**resource)
            .ok_or_else(|| ProviderError::UnknownResource(urn.type_token().to_string()))
    }

    /// Validates new inputs.
    ///
    /// # Errors
    ///
    /// Returns an error if the URN names an unknown type or the inputs cannot
    /// be decoded. Validation problems are reported as failures instead.
    pub async fn check(&self, request: CheckRequest) -> Result<CheckResponse> {
        debug!(urn = %request.urn, "check");
        let response = self.resource(&request.urn)?.check(request).await?;
        if !response.failures.is_empty() {
            debug!("{} check failure(s)", response.failures.len());
        }
        Ok(response)
    }

    /// Computes the changes between recorded state and new inputs.
    ///
    /// # Errors
    ///
    /// Returns an error if the URN names an unknown type or state cannot be
    /// decoded.
    pub async fn diff(&self, request: DiffRequest) -> Result<DiffResponse> {
        debug!(urn = %request.urn, id = %request.id, "diff");
        self.resource(&request.urn)?.diff(request).await
    }

    /// Creates a resource.
    ///
    /// # Errors
    ///
    /// Returns the adapter's error; [`ProviderError::InitFailed`] means the
    /// object exists remotely and must be recorded.
    pub async fn create(&self, request: CreateRequest) -> Result<CreateResponse> {
        info!(urn = %request.urn, "create");
        let urn = request.urn.clone();
        self.resource(&urn)?
            .create(self.api.as_ref(), request)
            .await
            .inspect_err(|e| warn!(urn = %urn, "create failed: {e}"))
    }

    /// Reads a resource. An empty id in the response means it no longer
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns the adapter's error.
    pub async fn read(&self, request: ReadRequest) -> Result<ReadResponse> {
        debug!(urn = %request.urn, id = %request.id, "read");
        let response = self.resource(&request.urn)?.read(self.api.as_ref(), request).await?;
        if response.is_gone() {
            info!("Resource no longer exists remotely");
        }
        Ok(response)
    }

    /// Updates a resource in place.
    ///
    /// # Errors
    ///
    /// Returns the adapter's error.
    pub async fn update(&self, request: UpdateRequest) -> Result<UpdateResponse> {
        info!(urn = %request.urn, id = %request.id, "update");
        let urn = request.urn.clone();
        self.resource(&urn)?
            .update(self.api.as_ref(), request)
            .await
            .inspect_err(|e| warn!(urn = %urn, "update failed: {e}"))
    }

    /// Deletes a resource.
    ///
    /// # Errors
    ///
    /// Returns the adapter's error.
    pub async fn delete(&self, request: DeleteRequest) -> Result<()> {
        info!(urn = %request.urn, id = %request.id, "delete");
        let urn = request.urn.clone();
        self.resource(&urn)?
            .delete(self.api.as_ref(), request)
            .await
            .inspect_err(|e| warn!(urn = %urn, "delete failed: {e}"))
    }

    /// Calls a provider function.
    ///
    /// # Errors
    ///
    /// Returns an error if the token names no function or the call fails.
    pub async fn invoke(&self, request: InvokeRequest) -> Result<InvokeResponse> {
        debug!(token = %request.token, "invoke");
        let function = self
            .functions
            .get(request.token.as_str())
            .ok_or_else(|| ProviderError::UnknownFunction(request.token.clone()))?;
        function.invoke(self.api.as_ref(), request.args).await
    }
}
