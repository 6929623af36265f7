//! Logging initialization shared by the EQUIPOS binaries
//!
//! Filter resolution order:
//! 1. CLI flags (`-v/-q`) when the user passed any
//! 2. `RUST_LOG`
//! 3. The binary default handed in by the caller

use anyhow::Result;
use clap_verbosity_flag::{LogLevel, Verbosity};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format of the fmt layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable single-line output
    #[default]
    Compact,
    /// One JSON object per event, for log shipping
    Json,
}

/// Build the filter following the resolution order described at module level.
pub fn build_filter<L: LogLevel>(verbosity: &Verbosity<L>, default_filter: &str) -> Result<EnvFilter> {
    if verbosity.is_present() {
        let level = verbosity.log_level_filter().to_string().to_lowercase();
        return Ok(EnvFilter::try_new(level)?);
    }

    Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
}

/// Install the global subscriber.
///
/// # Example
///
/// ```no_run
/// use clap_verbosity_flag::{InfoLevel, Verbosity};
/// use equipos_common::logging::{self, LogFormat};
///
/// let verbosity = Verbosity::<InfoLevel>::default();
/// logging::init_logging(&verbosity, "equipos_billing=info", LogFormat::Compact).unwrap();
/// ```
pub fn init_logging<L: LogLevel>(
    verbosity: &Verbosity<L>,
    default_filter: &str,
    format: LogFormat,
) -> Result<()> {
    let filter = build_filter(verbosity, default_filter)?;
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()?,
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .json(),
            )
            .try_init()?,
    }

    Ok(())
}
