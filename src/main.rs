//! Provider CLI entrypoint.
//!
//! Reads one JSON request, runs it through the provider and prints the
//! response on stdout. Logs go to stderr.

use std::path::Path;
use std::process::ExitCode;

use pulumiservice_provider::cli::{Cli, Commands, OutputFormatter, read_request, write_response};
use pulumiservice_provider::config::ConfigLoader;
use pulumiservice_provider::error::Result;
use pulumiservice_provider::resources::Provider;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.log_json);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let formatter = OutputFormatter::new(cli.output);
    match runtime.block_on(run(cli, &formatter)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let rendered = formatter.format_error(&e);
            if !formatter.is_json() || emit(&rendered).is_err() {
                eprint!("{rendered}");
            }
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system on stderr.
fn init_logging(verbose: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Writes a response to stdout.
fn emit(text: &str) -> std::io::Result<()> {
    write_response(&mut std::io::stdout().lock(), text)
}

/// Main async entry point.
async fn run(cli: Cli, formatter: &OutputFormatter) -> Result<()> {
    let base_path = cli
        .config
        .as_deref()
        .and_then(Path::parent)
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    let config = ConfigLoader::new()
        .with_base_path(base_path)
        .load(cli.config.as_deref(), &cli.host_variables())?;
    debug!("Loaded configuration: {config:?}");

    let provider = Provider::configure(&config)?;
    let input = cli.command.request().input.clone();
    let input = input.as_deref();

    let rendered = match cli.command {
        Commands::Check(_) => formatter.format_check(&provider.check(read_request(input)?).await?),
        Commands::Diff(_) => formatter.format_diff(&provider.diff(read_request(input)?).await?),
        Commands::Create(_) => formatter.format_create(&provider.create(read_request(input)?).await?),
        Commands::Read(_) => formatter.format_read(&provider.read(read_request(input)?).await?),
        Commands::Update(_) => formatter.format_update(&provider.update(read_request(input)?).await?),
        Commands::Delete(_) => {
            provider.delete(read_request(input)?).await?;
            formatter.format_delete()
        }
        Commands::Invoke(_) => formatter.format_invoke(&provider.invoke(read_request(input)?).await?),
    };

    emit(&rendered)?;
    debug!("Request complete");
    Ok(())
}
