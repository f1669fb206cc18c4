//! Structured Logger
//!
//! Wraps `tracing` to provide console output, JSON file rotation (NDJSON),
//! and environment-based level control.

use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initialize the global logger with a console layer and a rolling file layer.
///
/// `RUST_LOG` wins over `level` when set.
pub fn init_logger<P: AsRef<Path>>(log_dir: P, level: &str) {
    // Rolling file appender: writes NDJSON to `<dir>/papervoice.log.YYYY-MM-DD`
    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "papervoice.log");

    let file_layer = fmt::layer()
        .json()
        .with_writer(file_appender)
        .with_ansi(false);

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(true);

    let _ = tracing_subscriber::registry()
        .with(env_filter(level))
        .with(console_layer)
        .with(file_layer)
        .try_init();
}

/// Console-only logger, for runs without a log directory.
pub fn init_console_logger(level: &str, json: bool) {
    let registry = tracing_subscriber::registry().with(env_filter(level));
    let _ = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        init_console_logger("debug", false);
        init_console_logger("info", true);
        tracing::info!("still logging");
    }
}
