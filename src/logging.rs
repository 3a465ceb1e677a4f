//! Tracing subscriber setup.
//!
//! Logs go to stderr so the run summary on stdout stays clean. On a
//! terminal the output is colored and untimestamped; otherwise every line
//! carries an RFC 3339 timestamp and no ANSI escapes. `RUST_LOG` overrides
//! the level passed on the command line.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

pub fn init_logging(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| anyhow!("Invalid log level '{}': {}", level, e))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = if atty::is(atty::Stream::Stderr) {
        builder.with_ansi(true).without_time().try_init()
    } else {
        builder.with_ansi(false).try_init()
    };

    result.map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}
