//! `pulumiservice:index:Deployment`.
//!
//! Every create or update submits an `update` deployment against the target
//! stack and waits for it to finish; delete runs `destroy`. Stack config given
//! as inputs is folded into the run's pre-run commands.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::api::{CreateDeploymentRequest, DeploymentSettings, LogLine, ServiceApi, StackName};
use crate::codec::{FieldValue, PropertyRecord};
use crate::deployment::{Deadline, DeploymentExecutor, LogSink, RoundOutcome, prepare_deployment};
use crate::diff::{DiffEngine, DiffResponse};
use crate::error::{ProviderError, Result};
use crate::property::{PropertyMap, PropertyValue};
use crate::property_record;

use super::resource::Resource;
use super::types::{
    CheckFailure, CheckRequest, CheckResponse, CreateRequest, CreateResponse, DeleteRequest,
    DiffRequest, ReadRequest, ReadResponse, UpdateRequest, UpdateResponse,
};

const TYPE_TOKEN: &str = "pulumiservice:index:Deployment";

/// Output holding the version of the last deployment run.
const VERSION_KEY: &str = "version";

/// Default pause between status rounds.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Default, PartialEq)]
struct DeploymentInput {
    stack: String,
    config: Option<PropertyMap>,
    settings: Option<DeploymentSettings>,
}

property_record!(DeploymentInput {
    stack => "stack",
    config => "config",
    settings => "settings",
});

/// Forwards deployment output to the log, tagged with the resource URN.
struct TracingSink<'a> {
    urn: &'a str,
}

impl LogSink for TracingSink<'_> {
    fn line(&mut self, line: &LogLine) {
        if let Some(header) = line.header.as_deref().filter(|h| !h.is_empty()) {
            info!(urn = self.urn, "{header}");
        }
        info!(urn = self.urn, "{}", line.line);
    }
}

/// How a deployment run went wrong.
enum RunError {
    /// Nothing was submitted.
    Prepare(ProviderError),
    /// The run was submitted or attempted; `state` is what was recorded.
    Partial {
        id: String,
        state: PropertyMap,
        error: ProviderError,
    },
}

impl RunError {
    fn into_init_failed(self) -> ProviderError {
        match self {
            Self::Prepare(error) => error,
            Self::Partial { id, state, error } => ProviderError::InitFailed {
                id,
                properties: state,
                reasons: vec![error.to_string()],
            },
        }
    }

    fn into_error(self) -> ProviderError {
        match self {
            Self::Prepare(error) | Self::Partial { error, .. } => error,
        }
    }
}

/// Runs a deployment for a stack whenever its inputs change.
#[derive(Debug, Clone)]
pub struct DeploymentResource {
    poll_interval: Duration,
}

impl Default for DeploymentResource {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl DeploymentResource {
    /// Creates the resource, pausing `poll_interval` between status rounds.
    #[must_use]
    pub const fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Submits `operation` and drives it to completion.
    ///
    /// Returns the stack id and the inputs extended with the deployment
    /// version.
    async fn run(
        &self,
        api: &dyn ServiceApi,
        urn: &str,
        operation: &str,
        inputs: &PropertyMap,
        timeout: f64,
    ) -> std::result::Result<(String, PropertyMap), RunError> {
        let deadline = Deadline::from_secs_f64(timeout);

        let input = DeploymentInput::decode(inputs).map_err(|e| RunError::Prepare(e.into()))?;
        let stack = input
            .stack
            .parse::<StackName>()
            .map_err(|e| RunError::Prepare(e.into()))?;
        let settings = prepare_deployment(
            api,
            &stack,
            input.settings.unwrap_or_default(),
            &input.config.unwrap_or_default(),
        )
        .await
        .map_err(|e| {
            RunError::Prepare(ProviderError::from(e).context(format!("read deployment settings for stack ({stack})")))
        })?;

        let id = stack.to_string();
        let mut state = inputs.clone();
        let request = CreateDeploymentRequest {
            settings,
            operation: operation.to_string(),
            inherit_settings: true,
        };

        let executor = DeploymentExecutor::new(api, deadline);
        let mut run = match executor.submit(&stack, &request).await {
            Ok(run) => run,
            Err(e) => {
                return Err(RunError::Partial {
                    id,
                    state,
                    error: ProviderError::from(e).context(format!("create deployment for stack ({stack})")),
                });
            }
        };
        state.insert(VERSION_KEY.to_string(), run.version.to_property());

        let mut sink = TracingSink { urn };
        loop {
            match executor.advance(&mut run, &mut sink).await {
                Ok(RoundOutcome::Succeeded) => return Ok((id, state)),
                Ok(RoundOutcome::Pending) => {
                    let pause = executor
                        .deadline()
                        .remaining()
                        .map_or(self.poll_interval, |left| left.min(self.poll_interval));
                    tokio::time::sleep(pause).await;
                }
                Err(e) => {
                    warn!("Deployment {} for {stack} did not succeed: {e}", run.id);
                    return Err(RunError::Partial {
                        id,
                        state,
                        error: e.into(),
                    });
                }
            }
        }
    }
}

/// Checks that `key`, when set, holds an object.
fn expect_object(news: &PropertyMap, key: &str, failures: &mut Vec<CheckFailure>) {
    if let Some(value) = news.get(key).filter(|v| v.has_value()) {
        if value.unwrap_secret().as_object().is_none() {
            failures.push(CheckFailure::new(
                key,
                format!("expected an object, not a {}", value.unwrap_secret().kind_name()),
            ));
        }
    }
}

#[async_trait]
impl Resource for DeploymentResource {
    fn type_token(&self) -> &'static str {
        TYPE_TOKEN
    }

    async fn check(&self, request: CheckRequest) -> Result<CheckResponse> {
        let news = &request.news;
        let mut failures = Vec::new();

        match news.get("stack").filter(|v| v.has_value()).map(PropertyValue::unwrap_secret) {
            None => failures.push(CheckFailure::new("stack", "missing required property 'stack'")),
            Some(PropertyValue::String(stack)) => {
                if let Err(e) = stack.parse::<StackName>() {
                    failures.push(CheckFailure::new("stack", e.to_string()));
                }
            }
            Some(other) => failures.push(CheckFailure::new(
                "stack",
                format!("expected a string, not a {}", other.kind_name()),
            )),
        }
        expect_object(news, "config", &mut failures);
        expect_object(news, "settings", &mut failures);

        Ok(CheckResponse::new(request.news, failures))
    }

    async fn diff(&self, request: DiffRequest) -> Result<DiffResponse> {
        let mut diff = DiffEngine::new()
            .ignoring([VERSION_KEY])
            .ignoring(request.ignore_changes.iter().map(String::as_str))
            .diff(&request.olds, &request.news);
        // A new deployment runs on every update.
        diff.force_update(VERSION_KEY);
        Ok(diff.to_response(true))
    }

    async fn create(&self, api: &dyn ServiceApi, request: CreateRequest) -> Result<CreateResponse> {
        let (id, properties) = self
            .run(api, &request.urn, "update", &request.properties, request.timeout)
            .await
            .map_err(RunError::into_init_failed)?;
        info!("Deployment for {id} succeeded");
        Ok(CreateResponse { id, properties })
    }

    async fn read(&self, _api: &dyn ServiceApi, request: ReadRequest) -> Result<ReadResponse> {
        Ok(ReadResponse {
            id: request.id,
            properties: request.properties,
            inputs: request.inputs,
        })
    }

    async fn update(&self, api: &dyn ServiceApi, request: UpdateRequest) -> Result<UpdateResponse> {
        let (_, properties) = self
            .run(api, &request.urn, "update", &request.news, request.timeout)
            .await
            .map_err(RunError::into_init_failed)?;
        Ok(UpdateResponse { properties })
    }

    async fn delete(&self, api: &dyn ServiceApi, request: DeleteRequest) -> Result<()> {
        self.run(api, &request.urn, "destroy", &request.properties, request.timeout)
            .await
            .map_err(RunError::into_error)?;
        Ok(())
    }
}
