//! State of one remote deployment run.

use serde::Serialize;

use crate::api::{LogLine, StackName};

/// Classification of a remote status string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Still queued or running.
    Pending,
    /// Finished successfully.
    Succeeded,
    /// Finished with a failure.
    Failed,
    /// A status this provider does not know.
    Unexpected,
}

impl RunStatus {
    /// Classifies a status string reported by the service.
    #[must_use]
    pub fn classify(status: &str) -> Self {
        match status {
            "not-started" | "accepted" | "pending" | "running" => Self::Pending,
            "succeeded" => Self::Succeeded,
            "failed" => Self::Failed,
            _ => Self::Unexpected,
        }
    }

    /// Returns true once no further status change is expected.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A submitted deployment and everything observed about it so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRun {
    /// Stack the deployment runs against.
    pub stack: StackName,
    /// Deployment identifier.
    pub id: String,
    /// Deployment version number.
    pub version: i64,
    /// Console link, when the service returned one.
    pub console_url: Option<String>,
    /// Last status observed; empty before the first poll.
    pub status: String,
    /// Cursor of the log page to fetch next.
    #[serde(skip)]
    pub cursor: String,
    /// Lines of the page at `cursor` already delivered.
    #[serde(skip)]
    pub page_offset: usize,
    /// Every log line delivered so far.
    pub logs: Vec<LogLine>,
}

impl DeploymentRun {
    /// Creates a run from a submission response.
    #[must_use]
    pub fn new(stack: StackName, id: impl Into<String>, version: i64) -> Self {
        Self {
            stack,
            id: id.into(),
            version,
            ..Self::default()
        }
    }

    /// Classification of the last observed status.
    #[must_use]
    pub fn run_status(&self) -> RunStatus {
        RunStatus::classify(&self.status)
    }
}
