//! ami1b binary entry point.
//!
//! This is a thin wrapper around the ami1b-tool library that:
//! 1. Parses command-line arguments
//! 2. Initializes logging
//! 3. Runs the requested command

use ami1b_tool::Cli;
use anyhow::Result;

fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.default_log_level())),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Configuration loaded: {:?}", cli);

    ami1b_tool::run(&cli)
}
