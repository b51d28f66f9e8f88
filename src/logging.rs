//! Structured logging setup
//!
//! Console and/or rolling-file output with pretty or JSON formatting,
//! driven by the `logging` section of the configuration. `RUST_LOG` takes
//! precedence over the configured level.

use crate::config::get_config;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Initialize the logging system based on configuration.
pub fn init_logging() {
    let config = get_config();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.output.as_str() {
        "file" => init_file_logging(env_filter, &config.logging.format, &config.paths.log_directory),
        "both" => {
            init_combined_logging(env_filter, &config.logging.format, &config.paths.log_directory)
        }
        _ => init_console_logging(env_filter, &config.logging.format),
    }
}

fn init_console_logging(filter: EnvFilter, format: &str) {
    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        "json" => {
            subscriber
                .with(
                    fmt::layer()
                        .json()
                        .with_current_span(true)
                        .with_target(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .init();
        }
        _ => {
            subscriber
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_ansi(true)
                        .with_span_events(FmtSpan::CLOSE),
                )
                .init();
        }
    }
}

fn init_file_logging(filter: EnvFilter, format: &str, log_dir: &std::path::Path) {
    let file_appender = tracing_appender::rolling::daily(log_dir, "spotify-stats.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    // Keep the writer alive for the process lifetime.
    std::mem::forget(guard);

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        "json" => {
            subscriber
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(non_blocking)
                        .with_current_span(true),
                )
                .init();
        }
        _ => {
            subscriber
                .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                .init();
        }
    }
}

fn init_combined_logging(filter: EnvFilter, format: &str, log_dir: &std::path::Path) {
    let file_appender = tracing_appender::rolling::daily(log_dir, "spotify-stats.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    std::mem::forget(guard);

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        "json" => {
            subscriber
                .with(fmt::layer().json().with_writer(std::io::stdout))
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();
        }
        _ => {
            subscriber
                .with(fmt::layer().with_writer(std::io::stdout))
                .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
                .init();
        }
    }
}
