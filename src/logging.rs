//! Tracing subscriber setup

use anyhow::{Context, Result};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};

use crate::config::LoggingConfig;

/// Level directive for a `-v` count, falling back to the configured level.
#[must_use]
pub fn level_for_verbosity(configured: &str, verbose: u8) -> &str {
    match verbose {
        0 => configured,
        1 => "debug",
        _ => "trace",
    }
}

/// Build the subscriber writing to `writer`. `RUST_LOG` wins over the
/// configured level unless `-v` was given.
pub fn build_subscriber<W>(
    config: &LoggingConfig,
    verbose: u8,
    writer: W,
) -> impl tracing::Subscriber + Send + Sync + use<W>
where
    W: for<'w> MakeWriter<'w> + Clone + Send + Sync + 'static,
{
    let level = level_for_verbosity(&config.level, verbose);
    let filter = if verbose == 0 {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let json = config.format == "json";
    let json_layer = json.then(|| {
        fmt::layer()
            .json()
            .with_target(true)
            .with_writer(writer.clone())
    });
    let pretty_layer = (!json).then(|| fmt::layer().with_target(false).with_writer(writer));

    Registry::default()
        .with(filter)
        .with(json_layer)
        .with(pretty_layer)
}

/// Install the global subscriber on stderr so stdout stays clean for results.
/// Fails when a global subscriber is already set.
pub fn init(config: &LoggingConfig, verbose: u8) -> Result<()> {
    tracing::subscriber::set_global_default(build_subscriber(config, verbose, std::io::stderr))
        .context("Logging is already initialized")?;
    Ok(())
}
