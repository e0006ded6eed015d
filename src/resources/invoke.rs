//! `pulumiservice:index:RunDeployment`.

use async_trait::async_trait;
use tracing::info;

use crate::api::{CreateDeploymentRequest, ServiceApi, StackName};
use crate::codec::PropertyRecord;
use crate::error::{ProviderError, Result};
use crate::property::PropertyMap;
use crate::property_record;

use super::resource::{Function, has_value};
use super::types::{CheckFailure, InvokeResponse};

const TOKEN: &str = "pulumiservice:index:RunDeployment";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct RunDeploymentArgs {
    organization: String,
    project: String,
    stack: String,
    operation: String,
    inherit_settings: bool,
}

property_record!(RunDeploymentArgs {
    organization => "organization",
    project => "project",
    stack => "stack",
    operation => "operation",
    inherit_settings => "inheritSettings",
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct RunDeploymentResult {
    id: String,
    version: i64,
    console_url: Option<String>,
}

property_record!(RunDeploymentResult {
    id => "id",
    version => "version",
    console_url => "consoleUrl",
});

/// Starts a deployment without waiting for it to finish.
#[derive(Debug, Default)]
pub struct RunDeploymentFunction;

#[async_trait]
impl Function for RunDeploymentFunction {
    fn token(&self) -> &'static str {
        TOKEN
    }

    async fn invoke(&self, api: &dyn ServiceApi, args: PropertyMap) -> Result<InvokeResponse> {
        let failures: Vec<CheckFailure> = ["organization", "project", "stack", "operation"]
            .into_iter()
            .filter(|key| !has_value(&args, key))
            .map(|key| CheckFailure::new(key, format!("missing required argument '{key}'")))
            .collect();
        if !failures.is_empty() {
            return Ok(InvokeResponse {
                failures,
                ..InvokeResponse::default()
            });
        }

        let args = RunDeploymentArgs::decode(&args)?;
        let stack = StackName::new(args.organization, args.project, args.stack);
        let request = CreateDeploymentRequest {
            operation: args.operation,
            inherit_settings: args.inherit_settings,
            ..CreateDeploymentRequest::default()
        };

        let created = api
            .create_deployment(&stack, &request)
            .await
            .map_err(|e| ProviderError::from(e).context(format!("create deployment for stack ({stack})")))?;
        info!("Started {} deployment {} for {stack}", request.operation, created.id);

        let result = RunDeploymentResult {
            id: created.id,
            version: created.version,
            console_url: created.console_url,
        };
        Ok(InvokeResponse {
            properties: result.to_property_map(),
            failures: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CreateDeploymentResponse, MockServiceApi};
    use crate::error::ApiError;

    fn args() -> PropertyMap {
        PropertyMap::new()
            .with("organization", "acme")
            .with("project", "web")
            .with("stack", "prod")
            .with("operation", "refresh")
            .with("inheritSettings", true)
    }

    #[tokio::test]
    async fn test_returns_created_deployment() {
        let mut api = MockServiceApi::new();
        api.expect_create_deployment()
            .withf(|stack, req| {
                stack.to_string() == "acme/web/prod" && req.operation == "refresh" && req.inherit_settings
            })
            .times(1)
            .returning(|_, _| {
                Ok(CreateDeploymentResponse {
                    id: String::from("d9"),
                    version: 12,
                    console_url: Some(String::from("https://app.pulumi.com/acme/web/prod/deployments/12")),
                })
            });

        let response = RunDeploymentFunction.invoke(&api, args()).await.expect("invoke");

        assert!(response.failures.is_empty());
        assert_eq!(response.properties.get_str("id"), Some("d9"));
        assert_eq!(response.properties["version"].as_f64(), Some(12.0));
        assert_eq!(
            response.properties.get_str("consoleUrl"),
            Some("https://app.pulumi.com/acme/web/prod/deployments/12")
        );
    }

    #[tokio::test]
    async fn test_missing_arguments_are_failures() {
        let api = MockServiceApi::new();
        let mut partial = args();
        partial.remove("stack");

        let response = RunDeploymentFunction.invoke(&api, partial).await.expect("invoke");
        assert_eq!(
            response.failures,
            vec![CheckFailure::new("stack", "missing required argument 'stack'")]
        );
        assert!(response.properties.is_empty());
    }

    #[tokio::test]
    async fn test_service_error_names_the_stack() {
        let mut api = MockServiceApi::new();
        api.expect_create_deployment()
            .returning(|_, _| Err(ApiError::status(403, "forbidden")));

        let err = RunDeploymentFunction.invoke(&api, args()).await.expect_err("invoke");
        assert_eq!(
            err.to_string(),
            "failed to create deployment for stack (acme/web/prod): 403 API error: forbidden"
        );
    }
}
