//! # Logging
//!
//! The daemon logs through `tracing`, rendered by `tracing_subscriber::fmt`.
//!
//! - `RUST_LOG` takes precedence over `--log-filter` when set.
//! - `--log-format text` prints human-readable lines, `--log-format json`
//!   prints one JSON object per event.
//! - Timestamps are local time in RFC 3339.
//!
//! ```bash
//! RUST_LOG=flurry=trace,flurryd=debug flurryd -m 1
//! flurryd -m 1 --log-format json --log-filter warn
//! ```

use crate::server::config::LogFormat;
use tracing_subscriber::{
    EnvFilter, fmt::time::ChronoLocal, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Installs the global subscriber.
///
/// # Errors
///
/// Fails if a global subscriber was already installed.
pub fn init_telemetry(filter: &str, format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .with_target(false)
                    .with_timer(ChronoLocal::rfc_3339())
                    .with_file(true),
            )
            .try_init()?,
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_span_list(true)
                    .with_current_span(false)
                    .with_target(true)
                    .with_timer(ChronoLocal::rfc_3339()),
            )
            .try_init()?,
    }

    Ok(())
}
