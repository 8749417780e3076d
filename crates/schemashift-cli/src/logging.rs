use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;

use crate::settings::{LogFormat, LogSettings};
use crate::{CliError, CliResult};

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
/// Output goes to stderr so stdout stays reserved for command results.
pub fn init_logging(settings: &LogSettings) -> CliResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|err| CliError::Logging(err.to_string()))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = match settings.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_timer(UtcTime::rfc_3339())
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_timer(UtcTime::rfc_3339())
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    result.map_err(|err| CliError::Logging(err.to_string()))
}
