//! Remote deployment execution.
//!
//! A deployment is one remote Pulumi operation run by the service. The
//! [`DeploymentExecutor`] submits it and then advances it one round at a time:
//! each round drains the log pages available so far and checks the status
//! once. Repeating rounds, and the delay between them, is up to the caller.

mod executor;
mod prepare;
mod run;

pub use executor::{Deadline, DeploymentExecutor, LogSink, RoundOutcome};
pub use prepare::prepare_deployment;
pub use run::{DeploymentRun, RunStatus};
