//! Service API seam used by resources and the deployment executor.

use async_trait::async_trait;

use crate::error::ApiError;

use super::types::{
    AccessToken, CreateDeploymentRequest, CreateDeploymentResponse, CreateTeamRequest, Deployment,
    DeploymentLogs, DeploymentSettings, MemberAction, Stack, StackName, Team, Webhook, WebhookId,
    WebhookRequest,
};

/// Result type for service calls.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Operations against the Pulumi Cloud REST API.
///
/// Lookups return `Ok(None)` when the service answers 404.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServiceApi: Send + Sync {
    /// Submits a deployment for a stack.
    async fn create_deployment(
        &self,
        stack: &StackName,
        request: &CreateDeploymentRequest,
    ) -> ApiResult<CreateDeploymentResponse>;

    /// Fetches a deployment's current status.
    async fn get_deployment(&self, stack: &StackName, id: &str) -> ApiResult<Option<Deployment>>;

    /// Fetches one page of deployment logs starting at `continuation_token`.
    async fn get_deployment_logs(
        &self,
        stack: &StackName,
        id: &str,
        continuation_token: &str,
    ) -> ApiResult<DeploymentLogs>;

    /// Fetches the deployment settings stored on a stack.
    async fn get_deployment_settings(&self, stack: &StackName) -> ApiResult<Option<DeploymentSettings>>;

    /// Creates an empty stack.
    async fn create_stack(&self, stack: &StackName) -> ApiResult<()>;

    /// Looks up a stack.
    async fn get_stack(&self, stack: &StackName) -> ApiResult<Option<Stack>>;

    /// Deletes a stack; `force` deletes it even if it still has resources.
    async fn delete_stack(&self, stack: &StackName, force: bool) -> ApiResult<()>;

    /// Creates a personal access token.
    async fn create_access_token(&self, description: &str) -> ApiResult<AccessToken>;

    /// Deletes a personal access token.
    async fn delete_access_token(&self, id: &str) -> ApiResult<()>;

    /// Creates a team.
    async fn create_team(&self, request: &CreateTeamRequest) -> ApiResult<Team>;

    /// Looks up a team.
    async fn get_team(&self, organization: &str, name: &str) -> ApiResult<Option<Team>>;

    /// Changes a team's display name and description.
    async fn update_team(
        &self,
        organization: &str,
        name: &str,
        display_name: &str,
        description: &str,
    ) -> ApiResult<()>;

    /// Deletes a team.
    async fn delete_team(&self, organization: &str, name: &str) -> ApiResult<()>;

    /// Adds or removes one team member.
    async fn update_team_membership(
        &self,
        organization: &str,
        team: &str,
        member: &str,
        action: MemberAction,
    ) -> ApiResult<()>;

    /// Creates a webhook.
    async fn create_webhook(&self, request: &WebhookRequest) -> ApiResult<Webhook>;

    /// Looks up a webhook.
    async fn get_webhook(&self, id: &WebhookId) -> ApiResult<Option<Webhook>>;

    /// Replaces a webhook's mutable fields.
    async fn update_webhook(&self, id: &WebhookId, request: &WebhookRequest) -> ApiResult<()>;

    /// Deletes a webhook.
    async fn delete_webhook(&self, id: &WebhookId) -> ApiResult<()>;
}
