/// stlmesh - decode STL files and print mesh statistics
///
/// Usage: stlmesh [--format auto|binary|ascii] [--release] [-v] <PATH>...
/// Log output is controlled with RUST_LOG.
use std::process::ExitCode;

use clap::Parser;
use stlmesh_cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .init();

    if stlmesh_cli::run(&cli) == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
