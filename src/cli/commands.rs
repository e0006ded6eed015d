//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Args, Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Pulumi Cloud resource provider harness.
///
/// Each subcommand reads one JSON request and prints the JSON response.
#[derive(Parser, Debug)]
#[command(name = "pulumiservice-provider")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the provider configuration file.
    #[arg(short, long, global = true, env = "PULUMISERVICE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "json")]
    pub output: OutputFormat,

    /// Provider variable as sent by the host, e.g.
    /// `pulumiservice:config:accessToken=pul-...`. Repeatable.
    #[arg(long = "var", global = true, value_parser = parse_variable)]
    pub vars: Vec<(String, String)>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Where a request is read from.
#[derive(Args, Debug, Clone, Default)]
pub struct RequestArgs {
    /// JSON request file; stdin when omitted.
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate new inputs for a resource.
    Check(RequestArgs),

    /// Compute the changes between recorded state and new inputs.
    Diff(RequestArgs),

    /// Create a resource.
    Create(RequestArgs),

    /// Read a resource's current state.
    Read(RequestArgs),

    /// Update a resource in place.
    Update(RequestArgs),

    /// Delete a resource.
    Delete(RequestArgs),

    /// Call a provider function.
    Invoke(RequestArgs),
}

impl Commands {
    /// The request source of any command.
    #[must_use]
    pub const fn request(&self) -> &RequestArgs {
        match self {
            Self::Check(args)
            | Self::Diff(args)
            | Self::Create(args)
            | Self::Read(args)
            | Self::Update(args)
            | Self::Delete(args)
            | Self::Invoke(args) => args,
        }
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output for scripting.
    #[default]
    Json,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Host variables given with `--var`.
    #[must_use]
    pub fn host_variables(&self) -> BTreeMap<String, String> {
        self.vars.iter().cloned().collect()
    }
}

fn parse_variable(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))
}
