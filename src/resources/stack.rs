//! `pulumiservice:index:Stack`.

use async_trait::async_trait;
use tracing::info;

use crate::api::{ServiceApi, StackName};
use crate::codec::PropertyRecord;
use crate::diff::{DiffEngine, DiffResponse};
use crate::error::{ProviderError, Result};
use crate::property_record;

use super::resource::{Resource, has_value};
use super::types::{
    CheckFailure, CheckRequest, CheckResponse, CreateRequest, CreateResponse, DeleteRequest,
    DiffRequest, ReadRequest, ReadResponse, UpdateRequest, UpdateResponse,
};

const TYPE_TOKEN: &str = "pulumiservice:index:Stack";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct StackInput {
    organization_name: String,
    project_name: String,
    stack_name: String,
    force_destroy: Option<bool>,
}

property_record!(StackInput {
    organization_name => "organizationName",
    project_name => "projectName",
    stack_name => "stackName",
    force_destroy => "forceDestroy",
});

impl StackInput {
    fn name(&self) -> StackName {
        StackName::new(&self.organization_name, &self.project_name, &self.stack_name)
    }
}

/// An empty stack. Every change replaces it.
#[derive(Debug, Default)]
pub struct StackResource;

#[async_trait]
impl Resource for StackResource {
    fn type_token(&self) -> &'static str {
        TYPE_TOKEN
    }

    async fn check(&self, request: CheckRequest) -> Result<CheckResponse> {
        let failures = ["organizationName", "projectName", "stackName"]
            .into_iter()
            .filter(|key| !has_value(&request.news, key))
            .map(|key| CheckFailure::new(key, format!("missing required property '{key}'")))
            .collect();
        Ok(CheckResponse::new(request.news, failures))
    }

    async fn diff(&self, request: DiffRequest) -> Result<DiffResponse> {
        let diff = DiffEngine::new()
            .replace_on_any_change()
            .diff(&request.old_inputs, &request.news);
        Ok(diff.to_response(true))
    }

    async fn create(&self, api: &dyn ServiceApi, request: CreateRequest) -> Result<CreateResponse> {
        let input = StackInput::decode(&request.properties)?;
        let stack = input.name();

        api.create_stack(&stack)
            .await
            .map_err(|e| ProviderError::from(e).context(format!("create stack ({stack})")))?;
        info!("Created stack {stack}");

        Ok(CreateResponse {
            id: stack.to_string(),
            properties: input.to_property_map(),
        })
    }

    async fn read(&self, api: &dyn ServiceApi, request: ReadRequest) -> Result<ReadResponse> {
        let mut input = StackInput::decode(&request.properties)?;
        if input.stack_name.is_empty() {
            let stack: StackName = request.id.parse()?;
            input.organization_name = stack.organization;
            input.project_name = stack.project;
            input.stack_name = stack.stack;
        }

        let stack = input.name();
        let found = api
            .get_stack(&stack)
            .await
            .map_err(|e| ProviderError::from(e).context(format!("check if stack {stack} exists")))?;
        if found.is_none() {
            return Ok(ReadResponse::gone());
        }

        let properties = input.to_property_map();
        Ok(ReadResponse {
            id: request.id,
            inputs: properties.clone(),
            properties,
        })
    }

    async fn update(&self, _api: &dyn ServiceApi, _request: UpdateRequest) -> Result<UpdateResponse> {
        Err(ProviderError::Unsupported {
            operation: "update",
            resource: TYPE_TOKEN,
        })
    }

    async fn delete(&self, api: &dyn ServiceApi, request: DeleteRequest) -> Result<()> {
        let input = StackInput::decode(&request.properties)?;
        let stack = input.name();

        api.delete_stack(&stack, input.force_destroy.unwrap_or(false))
            .await
            .map_err(|e| ProviderError::from(e).context(format!("delete stack ({stack})")))?;
        info!("Deleted stack {stack}");
        Ok(())
    }
}
