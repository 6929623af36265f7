//! Main entry point for the equipos-billing CLI

use anyhow::{anyhow, Result};
use clap::Parser;
use equipos_billing::cli::{output, Args};
use equipos_common::logging::{self, LogFormat};
use tracing::error;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let binary_name = env!("CARGO_BIN_NAME").replace('-', "_");
    let default_filter = format!("{binary_name}=warn,equipos_common=warn");
    let format = if args.log_json {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    logging::init_logging(&args.verbosity, &default_filter, format)
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    if let Err(e) = args.run().await {
        error!(code = e.error_code(), "{}", e);
        output::print_error(&e.user_message());
        std::process::exit(1);
    }

    Ok(())
}
