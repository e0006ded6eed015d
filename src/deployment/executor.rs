//! Submit-and-poll driver for remote deployments.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, trace};

use crate::api::{ApiResult, CreateDeploymentRequest, LogLine, ServiceApi, StackName};
use crate::error::{ApiError, DeploymentError};

use super::run::{DeploymentRun, RunStatus};

/// Point in time after which no further requests are issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// No deadline.
    #[must_use]
    pub const fn none() -> Self {
        Self(None)
    }

    /// A deadline `timeout` from now.
    #[must_use]
    pub fn after(timeout: Duration) -> Self {
        Self(Instant::now().checked_add(timeout))
    }

    /// A deadline from a host timeout in seconds; zero or less means none.
    #[must_use]
    pub fn from_secs_f64(secs: f64) -> Self {
        if secs > 0.0 {
            Duration::try_from_secs_f64(secs).map_or(Self::none(), Self::after)
        } else {
            Self::none()
        }
    }

    /// Time left, or `None` when unbounded.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.0.map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Returns true once the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining().is_some_and(|left| left.is_zero())
    }
}

/// Receives deployment log lines as they arrive.
pub trait LogSink: Send {
    /// Called once per line, in order.
    fn line(&mut self, line: &LogLine);
}

impl<F> LogSink for F
where
    F: FnMut(&LogLine) + Send,
{
    fn line(&mut self, line: &LogLine) {
        self(line);
    }
}

/// Result of one successful poll round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    /// The run is still going; poll again later.
    Pending,
    /// The run finished successfully.
    Succeeded,
}

/// Why a bounded request did not produce a value.
enum Interrupted {
    Deadline,
    Api(ApiError),
}

impl Interrupted {
    fn into_error(self, run: &DeploymentRun) -> DeploymentError {
        let run = Box::new(run.clone());
        match self {
            Self::Deadline => DeploymentError::DeadlineExceeded { run: Some(run) },
            Self::Api(source) => DeploymentError::Poll { run, source },
        }
    }
}

/// Drives a single deployment against the service.
pub struct DeploymentExecutor<'a> {
    api: &'a dyn ServiceApi,
    deadline: Deadline,
}

impl<'a> DeploymentExecutor<'a> {
    /// Creates an executor bound by `deadline`.
    #[must_use]
    pub fn new(api: &'a dyn ServiceApi, deadline: Deadline) -> Self {
        Self { api, deadline }
    }

    /// The deadline covering submission and every round.
    #[must_use]
    pub const fn deadline(&self) -> Deadline {
        self.deadline
    }

    /// Submits the deployment.
    ///
    /// # Errors
    ///
    /// Returns `Submit` when the request fails and `DeadlineExceeded` without
    /// a run when the deadline passes first. No run exists afterwards.
    pub async fn submit(
        &self,
        stack: &StackName,
        request: &CreateDeploymentRequest,
    ) -> Result<DeploymentRun, DeploymentError> {
        info!("Submitting {} deployment for {stack}", request.operation);

        let created = match self.bounded(self.api.create_deployment(stack, request)).await {
            Ok(created) => created,
            Err(Interrupted::Api(e)) => return Err(DeploymentError::Submit(e)),
            Err(Interrupted::Deadline) => return Err(DeploymentError::DeadlineExceeded { run: None }),
        };

        debug!("Deployment {} created at version {}", created.id, created.version);
        let mut run = DeploymentRun::new(stack.clone(), created.id, created.version);
        run.console_url = created.console_url;
        Ok(run)
    }

    /// Performs one round: drains the available log pages, then checks the
    /// status once.
    ///
    /// Each line is handed to `sink` exactly once across rounds.
    ///
    /// # Errors
    ///
    /// Returns an error carrying the partial run when the deadline passes, a
    /// request fails, or the run ends in a non-success status.
    pub async fn advance(
        &self,
        run: &mut DeploymentRun,
        sink: &mut dyn LogSink,
    ) -> Result<RoundOutcome, DeploymentError> {
        match run.run_status() {
            RunStatus::Succeeded => return Ok(RoundOutcome::Succeeded),
            RunStatus::Failed => return Err(DeploymentError::Failed { run: Box::new(run.clone()) }),
            RunStatus::Pending | RunStatus::Unexpected => {}
        }

        self.drain_logs(run, sink).await?;

        let fetched = self
            .bounded(self.api.get_deployment(&run.stack, &run.id))
            .await
            .map_err(|e| e.into_error(run))?;
        let Some(deployment) = fetched else {
            return Err(DeploymentError::Poll {
                source: ApiError::status(404, format!("deployment {} not found", run.id)),
                run: Box::new(run.clone()),
            });
        };

        trace!("Deployment {} status: {}", run.id, deployment.status);
        run.status = deployment.status;

        match run.run_status() {
            RunStatus::Pending => Ok(RoundOutcome::Pending),
            RunStatus::Succeeded => {
                info!("Deployment {} succeeded", run.id);
                Ok(RoundOutcome::Succeeded)
            }
            RunStatus::Failed => Err(DeploymentError::Failed { run: Box::new(run.clone()) }),
            RunStatus::Unexpected => Err(DeploymentError::UnexpectedRemoteStatus {
                status: run.status.clone(),
                run: Box::new(run.clone()),
            }),
        }
    }

    /// Fetches pages until the service reports no next cursor.
    async fn drain_logs(
        &self,
        run: &mut DeploymentRun,
        sink: &mut dyn LogSink,
    ) -> Result<(), DeploymentError> {
        loop {
            let page = self
                .bounded(self.api.get_deployment_logs(&run.stack, &run.id, &run.cursor))
                .await
                .map_err(|e| e.into_error(run))?;

            // A page without a next cursor may grow; skip what was already seen.
            let page_len = page.lines.len();
            for line in page.lines.into_iter().skip(run.page_offset) {
                sink.line(&line);
                run.logs.push(line);
            }

            if page.next_token.is_empty() {
                run.page_offset = run.page_offset.max(page_len);
                return Ok(());
            }
            run.cursor = page.next_token;
            run.page_offset = 0;
        }
    }

    async fn bounded<T>(&self, request: impl Future<Output = ApiResult<T>>) -> Result<T, Interrupted> {
        match self.deadline.remaining() {
            None => request.await.map_err(Interrupted::Api),
            Some(left) if left.is_zero() => Err(Interrupted::Deadline),
            Some(left) => match tokio::time::timeout(left, request).await {
                Ok(result) => result.map_err(Interrupted::Api),
                Err(_) => Err(Interrupted::Deadline),
            },
        }
    }
}
