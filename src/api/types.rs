//! Pulumi Cloud REST API types.
//!
//! These types represent the request and response bodies exchanged with the
//! service, plus the composite identifiers used to address stacks and hooks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::PropertyError;
use crate::property_record;
use crate::secrets::SecretValue;

/// Fully-qualified stack name, `org/project/stack`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StackName {
    /// Organization name.
    pub organization: String,
    /// Project name.
    pub project: String,
    /// Stack name.
    pub stack: String,
}

impl StackName {
    /// Creates a stack name from its parts.
    #[must_use]
    pub fn new(organization: impl Into<String>, project: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            project: project.into(),
            stack: stack.into(),
        }
    }
}

impl FromStr for StackName {
    type Err = PropertyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split('/').collect::<Vec<_>>().as_slice() {
            [org, project, stack] if !org.is_empty() && !project.is_empty() && !stack.is_empty() => {
                Ok(Self::new(*org, *project, *stack))
            }
            _ => Err(PropertyError::invalid_id("stack", s)),
        }
    }
}

impl fmt::Display for StackName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.organization, self.project, self.stack)
    }
}

/// Identifier of an organization or stack webhook.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WebhookId {
    /// Organization name.
    pub organization: String,
    /// Project and stack, for stack-scoped hooks.
    pub stack: Option<(String, String)>,
    /// Hook name assigned by the service.
    pub name: String,
}

impl WebhookId {
    /// REST path of the hook collection this hook lives in.
    #[must_use]
    pub fn collection_path(&self) -> String {
        match &self.stack {
            Some((project, stack)) => format!("stacks/{}/{project}/{stack}/hooks", self.organization),
            None => format!("orgs/{}/hooks", self.organization),
        }
    }
}

impl FromStr for WebhookId {
    type Err = PropertyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(PropertyError::invalid_id("webhook", s));
        }
        match parts.as_slice() {
            [org, name] => Ok(Self {
                organization: (*org).to_string(),
                stack: None,
                name: (*name).to_string(),
            }),
            [org, project, stack, name] => Ok(Self {
                organization: (*org).to_string(),
                stack: Some(((*project).to_string(), (*stack).to_string())),
                name: (*name).to_string(),
            }),
            _ => Err(PropertyError::invalid_id("webhook", s)),
        }
    }
}

impl fmt::Display for WebhookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.stack {
            Some((project, stack)) => write!(f, "{}/{project}/{stack}/{}", self.organization, self.name),
            None => write!(f, "{}/{}", self.organization, self.name),
        }
    }
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorResponse {
    /// Status code reported by the service; 0 when absent.
    #[serde(default)]
    pub code: u16,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
}

// ============================================================================
// Deployments
// ============================================================================

/// Options for the deployment operation context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationContextOptions {
    /// Skip the dependency installation step.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skip_install_dependencies: bool,
    /// Shell used to run commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
}

property_record!(OperationContextOptions {
    skip_install_dependencies => "skipInstallDependencies",
    shell => "shell",
});

/// Commands and environment for a deployment run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationContext {
    /// Operation options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<OperationContextOptions>,
    /// Commands run before the Pulumi operation.
    #[serde(rename = "PreRunCommands", alias = "preRunCommands", default, skip_serializing_if = "Vec::is_empty")]
    pub pre_run_commands: Vec<String>,
    /// Environment variables available to the run.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment_variables: BTreeMap<String, SecretValue>,
    /// Cloud OIDC configuration, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oidc: Option<serde_json::Value>,
}

property_record!(OperationContext {
    options => "options",
    pre_run_commands => "preRunCommands",
    environment_variables => "environmentVariables",
    oidc => "oidc",
});

/// GitHub integration settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitHubConfiguration {
    /// `owner/repo` of the repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    /// Deploy on every commit to the branch.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deploy_commits: bool,
    /// Run previews for pull requests.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub preview_pull_requests: bool,
    /// Paths that trigger deployments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
}

property_record!(GitHubConfiguration {
    repository => "repository",
    deploy_commits => "deployCommits",
    preview_pull_requests => "previewPullRequests",
    paths => "paths",
});

/// Deployment settings, either stored on a stack or supplied per run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSettings {
    /// Commands and environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_context: Option<OperationContext>,
    /// GitHub integration.
    #[serde(rename = "gitHub", default, skip_serializing_if = "Option::is_none")]
    pub github: Option<GitHubConfiguration>,
    /// Source location, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_context: Option<serde_json::Value>,
    /// Executor image, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executor_context: Option<serde_json::Value>,
}

property_record!(DeploymentSettings {
    operation_context => "operationContext",
    github => "github",
    source_context => "sourceContext",
    executor_context => "executorContext",
});

/// Body of a create-deployment request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeploymentRequest {
    /// Per-run settings, merged over the stack's stored settings.
    #[serde(flatten)]
    pub settings: DeploymentSettings,
    /// Pulumi operation: `update`, `preview`, `refresh` or `destroy`.
    pub operation: String,
    /// Whether the stack's stored settings apply.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub inherit_settings: bool,
}

/// Response to a create-deployment request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeploymentResponse {
    /// Deployment identifier.
    pub id: String,
    /// Deployment version number.
    pub version: i64,
    /// Link to the deployment in the console.
    #[serde(default)]
    pub console_url: Option<String>,
}

/// Current state of a deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    /// Deployment identifier.
    pub id: String,
    /// Status string, e.g. `running` or `succeeded`.
    pub status: String,
    /// Deployment version number.
    pub version: i64,
    /// Creation time as reported by the service.
    #[serde(default)]
    pub created: Option<String>,
    /// Last modification time as reported by the service.
    #[serde(default)]
    pub modified: Option<String>,
}

/// One line of deployment output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    /// Step header, when the line opens a new step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    /// When the line was produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Line text.
    #[serde(default)]
    pub line: String,
}

/// One page of deployment logs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentLogs {
    /// Lines in this page.
    #[serde(default)]
    pub lines: Vec<LogLine>,
    /// Cursor for the next page; empty when no more pages are available yet.
    #[serde(default)]
    pub next_token: String,
}

// ============================================================================
// Stacks, tokens, teams, webhooks
// ============================================================================

/// Stack as reported by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stack {
    /// Organization name.
    #[serde(default)]
    pub org_name: String,
    /// Project name.
    #[serde(default)]
    pub project_name: String,
    /// Stack name.
    #[serde(default)]
    pub stack_name: String,
}

/// A personal access token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    /// Token identifier.
    pub id: String,
    /// Token value; only returned on creation.
    #[serde(default)]
    pub token_value: String,
    /// Token description.
    #[serde(default)]
    pub description: String,
}

/// A team member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Login used to manage membership.
    #[serde(default)]
    pub github_login: String,
    /// Role within the team.
    #[serde(default)]
    pub role: String,
}

/// A team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    /// `pulumi` or `github`.
    #[serde(rename = "kind", default)]
    pub team_type: String,
    /// Team name.
    pub name: String,
    /// Display name.
    #[serde(default)]
    pub display_name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Members.
    #[serde(default)]
    pub members: Vec<TeamMember>,
}

/// Body of a create-team request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    /// Organization name.
    pub organization: String,
    /// `pulumi` or `github`.
    pub team_type: String,
    /// Team name.
    pub name: String,
    /// Display name.
    pub display_name: String,
    /// Description.
    pub description: String,
}

/// Team membership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberAction {
    /// Add the member.
    Add,
    /// Remove the member.
    Remove,
}

/// A webhook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    /// Name assigned by the service.
    pub name: String,
    /// Display name.
    #[serde(default)]
    pub display_name: String,
    /// Delivery URL.
    #[serde(default)]
    pub payload_url: String,
    /// Whether deliveries are enabled.
    #[serde(default)]
    pub active: bool,
    /// Shared secret; returned as ciphertext.
    #[serde(default)]
    pub secret: Option<String>,
}

/// Body of a create- or update-webhook request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    /// Hook name; set on update only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Organization name.
    pub organization_name: String,
    /// Project name, for stack hooks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    /// Stack name, for stack hooks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_name: Option<String>,
    /// Display name.
    pub display_name: String,
    /// Delivery URL.
    pub payload_url: String,
    /// Shared secret plaintext.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    /// Whether deliveries are enabled.
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stack_name_parse_and_display() {
        let name: StackName = "acme/web/prod".parse().expect("parse");
        assert_eq!(name, StackName::new("acme", "web", "prod"));
        assert_eq!(name.to_string(), "acme/web/prod");
    }

    #[test]
    fn test_stack_name_rejects_other_shapes() {
        for bad in ["acme/web", "acme/web/prod/extra", "acme//prod", ""] {
            let err = bad.parse::<StackName>().expect_err(bad);
            assert!(matches!(err, PropertyError::InvalidIdentifierFormat { kind: "stack", .. }));
        }
    }

    #[test]
    fn test_webhook_id_forms() {
        let org: WebhookId = "acme/hook1".parse().expect("org hook");
        assert_eq!(org.collection_path(), "orgs/acme/hooks");
        assert_eq!(org.to_string(), "acme/hook1");

        let stack: WebhookId = "acme/web/prod/hook2".parse().expect("stack hook");
        assert_eq!(stack.collection_path(), "stacks/acme/web/prod/hooks");
        assert_eq!(stack.to_string(), "acme/web/prod/hook2");

        assert!("acme/web/hook".parse::<WebhookId>().is_err());
    }

    #[test]
    fn test_create_deployment_request_flattens_settings() {
        let request = CreateDeploymentRequest {
            settings: DeploymentSettings {
                operation_context: Some(OperationContext {
                    pre_run_commands: vec![String::from("echo hi")],
                    environment_variables: BTreeMap::from([(
                        String::from("PLACEHOLDER_0"),
                        SecretValue::secret("pw"),
                    )]),
                    ..OperationContext::default()
                }),
                ..DeploymentSettings::default()
            },
            operation: String::from("update"),
            inherit_settings: true,
        };

        let body = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            body,
            json!({
                "operationContext": {
                    "PreRunCommands": ["echo hi"],
                    "environmentVariables": { "PLACEHOLDER_0": { "secret": "pw" } }
                },
                "operation": "update",
                "inheritSettings": true
            })
        );
    }

    #[test]
    fn test_deployment_logs_defaults() {
        let logs: DeploymentLogs = serde_json::from_value(json!({
            "lines": [{ "header": "Install", "timestamp": "2024-05-01T10:00:00Z", "line": "npm ci" }]
        }))
        .expect("decode");
        assert_eq!(logs.next_token, "");
        assert_eq!(logs.lines[0].header.as_deref(), Some("Install"));
        assert!(logs.lines[0].timestamp.is_some());
    }
}
