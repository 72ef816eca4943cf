#![forbid(unsafe_code)]

//! Logging bootstrap for hosts.
//!
//! Library code only emits `tracing` events. A host (a test binary, a demo
//! driver) calls [`init`] once to install a subscriber. The filter comes from
//! `UNIPARK_LOG` using `EnvFilter` syntax and defaults to `info`.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "UNIPARK_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Build the filter from `UNIPARK_LOG`, falling back to `info`.
#[must_use]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install a global fmt subscriber.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init(format: LogFormat) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true);
    let result = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().with_ansi(false).try_init(),
    };
    result.is_ok()
}
