//! Command-line harness for the provider.
//!
//! Each subcommand feeds one JSON request to the [`Provider`](crate::resources::Provider)
//! and prints its response.

mod commands;
mod input;
mod output;

pub use commands::{Cli, Commands, OutputFormat, RequestArgs};
pub use input::{parse_request, read_request};
pub use output::{OutputFormatter, write_response};
