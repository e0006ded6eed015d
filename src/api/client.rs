//! Pulumi Cloud REST client implementation.
//!
//! This module provides the authenticated HTTP client used by every resource
//! operation. Transport failures are surfaced as-is; retries are left to the
//! caller.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, trace};

use crate::error::ApiError;

use super::service::{ApiResult, ServiceApi};
use super::types::{
    AccessToken, CreateDeploymentRequest, CreateDeploymentResponse, CreateTeamRequest, Deployment,
    DeploymentLogs, DeploymentSettings, ErrorResponse, MemberAction, Stack, StackName, Team,
    Webhook, WebhookId, WebhookRequest,
};

/// Default service URL.
pub const DEFAULT_SERVICE_URL: &str = "https://api.pulumi.com";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Versioned media type accepted by the service.
const ACCEPT_MEDIA_TYPE: &str = "application/vnd.pulumi+8";

/// Identifies this client to the service.
const SOURCE_HEADER: &str = "X-Pulumi-Source";

/// Pulumi Cloud REST client.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    /// HTTP client.
    client: Client,
    /// Base URL, without the `/api` suffix.
    base_url: String,
    /// Access token.
    token: String,
}

impl ServiceClient {
    /// Creates a client with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(token: &str, service_url: &str) -> ApiResult<Self> {
        Self::with_timeout(token, service_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a client with a custom per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_timeout(token: &str, service_url: &str, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: service_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Returns the service base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/api/{path}", self.base_url);
        trace!("{method} {url}");

        self.client
            .request(method, url)
            .header(header::AUTHORIZATION, format!("token {}", self.token))
            .header(header::ACCEPT, ACCEPT_MEDIA_TYPE)
            .header(header::CONTENT_TYPE, "application/json")
            .header(SOURCE_HEADER, "provider")
    }

    /// Sends a request and turns non-2xx responses into errors.
    async fn send(&self, builder: RequestBuilder) -> ApiResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::transport(format!("request failed: {e}")))?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::error_from(response).await)
        }
    }

    /// Builds an error from a non-2xx response, preferring the service's message.
    async fn error_from(response: Response) -> ApiError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(err) if !err.message.is_empty() => {
                let code = if err.code == 0 { status } else { err.code };
                ApiError::status(code, err.message)
            }
            _ => ApiError::status(status, body),
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        response.json::<T>().await.map_err(|e| ApiError::InvalidResponse {
            message: format!("failed to parse response: {e}"),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.send(self.request(Method::GET, path)).await?;
        Self::decode(response).await
    }

    /// GET where 404 means the object does not exist.
    async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> ApiResult<Option<T>> {
        let response = self
            .request(Method::GET, path)
            .send()
            .await
            .map_err(|e| ApiError::transport(format!("request failed: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("{path} not found");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Self::decode(response).await.map(Some)
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        let response = self.send(self.request(Method::POST, path).json(body)).await?;
        Self::decode(response).await
    }

    async fn send_without_response<B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> ApiResult<()> {
        let mut builder = self.request(method, path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.send(builder).await.map(|_| ())
    }

    async fn delete(&self, path: &str) -> ApiResult<()> {
        self.send_without_response::<()>(Method::DELETE, path, None).await
    }
}

fn deployments_path(stack: &StackName) -> String {
    format!("preview/{stack}/deployments")
}

#[async_trait]
impl ServiceApi for ServiceClient {
    async fn create_deployment(
        &self,
        stack: &StackName,
        request: &CreateDeploymentRequest,
    ) -> ApiResult<CreateDeploymentResponse> {
        debug!("Creating {} deployment for stack {stack}", request.operation);
        self.post(&deployments_path(stack), request).await
    }

    async fn get_deployment(&self, stack: &StackName, id: &str) -> ApiResult<Option<Deployment>> {
        self.get_optional(&format!("{}/{id}", deployments_path(stack))).await
    }

    async fn get_deployment_logs(
        &self,
        stack: &StackName,
        id: &str,
        continuation_token: &str,
    ) -> ApiResult<DeploymentLogs> {
        let mut builder = self.request(Method::GET, &format!("{}/{id}/logs", deployments_path(stack)));
        if !continuation_token.is_empty() {
            builder = builder.query(&[("continuationToken", continuation_token)]);
        }
        let response = self.send(builder).await?;
        Self::decode(response).await
    }

    async fn get_deployment_settings(&self, stack: &StackName) -> ApiResult<Option<DeploymentSettings>> {
        self.get_optional(&format!("preview/{stack}/deployment/settings")).await
    }

    async fn create_stack(&self, stack: &StackName) -> ApiResult<()> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct CreateStackRequest<'a> {
            stack_name: &'a str,
        }

        let path = format!("stacks/{}/{}", stack.organization, stack.project);
        let body = CreateStackRequest {
            stack_name: &stack.stack,
        };
        self.send_without_response(Method::POST, &path, Some(&body)).await
    }

    async fn get_stack(&self, stack: &StackName) -> ApiResult<Option<Stack>> {
        self.get_optional(&format!("stacks/{stack}")).await
    }

    async fn delete_stack(&self, stack: &StackName, force: bool) -> ApiResult<()> {
        let mut builder = self.request(Method::DELETE, &format!("stacks/{stack}"));
        if force {
            builder = builder.query(&[("force", "true")]);
        }
        self.send(builder).await.map(|_| ())
    }

    async fn create_access_token(&self, description: &str) -> ApiResult<AccessToken> {
        #[derive(Serialize)]
        struct CreateTokenRequest<'a> {
            description: &'a str,
        }

        let mut token: AccessToken = self
            .post("user/tokens", &CreateTokenRequest { description })
            .await?;
        token.description = description.to_string();
        Ok(token)
    }

    async fn delete_access_token(&self, id: &str) -> ApiResult<()> {
        self.delete(&format!("user/tokens/{id}")).await
    }

    async fn create_team(&self, request: &CreateTeamRequest) -> ApiResult<Team> {
        let path = format!("orgs/{}/teams/{}", request.organization, request.team_type);
        self.post(&path, request).await
    }

    async fn get_team(&self, organization: &str, name: &str) -> ApiResult<Option<Team>> {
        self.get_optional(&format!("orgs/{organization}/teams/{name}")).await
    }

    async fn update_team(
        &self,
        organization: &str,
        name: &str,
        display_name: &str,
        description: &str,
    ) -> ApiResult<()> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct UpdateTeamRequest<'a> {
            new_display_name: &'a str,
            new_description: &'a str,
        }

        let body = UpdateTeamRequest {
            new_display_name: display_name,
            new_description: description,
        };
        self.send_without_response(Method::PATCH, &format!("orgs/{organization}/teams/{name}"), Some(&body))
            .await
    }

    async fn delete_team(&self, organization: &str, name: &str) -> ApiResult<()> {
        self.delete(&format!("orgs/{organization}/teams/{name}")).await
    }

    async fn update_team_membership(
        &self,
        organization: &str,
        team: &str,
        member: &str,
        action: MemberAction,
    ) -> ApiResult<()> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct MembershipRequest<'a> {
            member_action: MemberAction,
            member: &'a str,
        }

        let body = MembershipRequest {
            member_action: action,
            member,
        };
        self.send_without_response(Method::PATCH, &format!("orgs/{organization}/teams/{team}"), Some(&body))
            .await
    }

    async fn create_webhook(&self, request: &WebhookRequest) -> ApiResult<Webhook> {
        let path = match (&request.project_name, &request.stack_name) {
            (Some(project), Some(stack)) => {
                format!("stacks/{}/{project}/{stack}/hooks", request.organization_name)
            }
            _ => format!("orgs/{}/hooks", request.organization_name),
        };
        self.post(&path, request).await
    }

    async fn get_webhook(&self, id: &WebhookId) -> ApiResult<Option<Webhook>> {
        self.get_optional(&format!("{}/{}", id.collection_path(), id.name)).await
    }

    async fn update_webhook(&self, id: &WebhookId, request: &WebhookRequest) -> ApiResult<()> {
        let path = format!("{}/{}", id.collection_path(), id.name);
        self.send_without_response(Method::PATCH, &path, Some(request)).await
    }

    async fn delete_webhook(&self, id: &WebhookId) -> ApiResult<()> {
        self.delete(&format!("{}/{}", id.collection_path(), id.name)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ServiceClient {
        ServiceClient::new("pul-123", &server.uri()).expect("client")
    }

    fn stack() -> StackName {
        StackName::new("acme", "web", "prod")
    }

    #[tokio::test]
    async fn test_requests_carry_auth_and_version_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/stacks/acme/web/prod"))
            .and(header("Authorization", "token pul-123"))
            .and(header("Accept", "application/vnd.pulumi+8"))
            .and(header("X-Pulumi-Source", "provider"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "orgName": "acme", "projectName": "web", "stackName": "prod"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let found = client(&server).get_stack(&stack()).await.expect("get stack");
        assert_eq!(found.map(|s| s.stack_name), Some(String::from("prod")));
    }

    #[tokio::test]
    async fn test_lookups_treat_404_as_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "code": 404, "message": "not found"
            })))
            .mount(&server)
            .await;

        let client = client(&server);
        let hook: WebhookId = "acme/hook".parse().expect("id");
        assert!(client.get_stack(&stack()).await.expect("stack").is_none());
        assert!(client.get_team("acme", "devs").await.expect("team").is_none());
        assert!(client.get_webhook(&hook).await.expect("hook").is_none());
        assert!(client.get_deployment(&stack(), "d1").await.expect("deployment").is_none());
        assert!(client.get_deployment_settings(&stack()).await.expect("settings").is_none());
    }

    #[tokio::test]
    async fn test_error_body_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/user/tokens/tok-1"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "code": 404, "message": "token not found"
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .delete_access_token("tok-1")
            .await
            .expect_err("delete should fail");
        assert_eq!(err.to_string(), "404 API error: token not found");
    }

    #[tokio::test]
    async fn test_error_without_code_uses_http_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({ "message": "conflict" })))
            .mount(&server)
            .await;

        let err = client(&server)
            .create_access_token("ci")
            .await
            .expect_err("create should fail");
        assert!(matches!(err, ApiError::Status { status: 409, .. }));
    }

    #[tokio::test]
    async fn test_transport_error() {
        let client = ServiceClient::new("pul-123", "http://127.0.0.1:9").expect("client");
        let err = client.get_stack(&stack()).await.expect_err("no server");
        assert!(matches!(err, ApiError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_create_deployment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/preview/acme/web/prod/deployments"))
            .and(body_json(json!({ "operation": "update", "inheritSettings": true })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "d1", "version": 7, "consoleUrl": "https://app.pulumi.com/acme/web/prod/deployments/7"
            })))
            .mount(&server)
            .await;

        let request = CreateDeploymentRequest {
            operation: String::from("update"),
            inherit_settings: true,
            ..CreateDeploymentRequest::default()
        };
        let created = client(&server)
            .create_deployment(&stack(), &request)
            .await
            .expect("create deployment");
        assert_eq!(created.id, "d1");
        assert_eq!(created.version, 7);
        assert!(created.console_url.is_some());
    }

    #[tokio::test]
    async fn test_logs_pass_continuation_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/preview/acme/web/prod/deployments/d1/logs"))
            .and(query_param("continuationToken", "page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "lines": [{ "line": "done" }], "nextToken": ""
            })))
            .mount(&server)
            .await;

        let logs = client(&server)
            .get_deployment_logs(&stack(), "d1", "page-2")
            .await
            .expect("logs");
        assert_eq!(logs.lines.len(), 1);
        assert!(logs.next_token.is_empty());
    }

    #[tokio::test]
    async fn test_team_membership_body() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/orgs/acme/teams/devs"))
            .and(body_json(json!({ "memberAction": "add", "member": "alice" })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .update_team_membership("acme", "devs", "alice", MemberAction::Add)
            .await
            .expect("add member");
    }
}
