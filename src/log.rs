use std::{path::PathBuf, sync::OnceLock};

#[cfg(not(debug_assertions))]
use anyhow::anyhow;
use anyhow::{Context, Result};

use tracing::warn;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, registry::Registry};

#[cfg(not(debug_assertions))]
use crate::configuration::APP_NAME;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const LOG_FILE_NAME: &str = "fitpair.log";

/// Level used when none is requested on the command line.
pub fn default_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    }
}

/// Return the path to the log file.
///
/// - debug:  ./fitpair.log (current directory)
/// - release: XDG data dir + "fitpair/fitpair.log"
pub fn log_filepath() -> Result<PathBuf> {
    #[cfg(debug_assertions)]
    {
        Ok(PathBuf::from(LOG_FILE_NAME))
    }

    #[cfg(not(debug_assertions))]
    {
        xdg::BaseDirectories::with_prefix(APP_NAME)
            .place_data_file(LOG_FILE_NAME)
            .map_err(|e| anyhow!("Could not determine log file path: {e}"))
    }
}

fn build_file_writer() -> Result<NonBlocking> {
    let path = log_filepath()?;

    let dir = path
        .parent()
        .context("Could not determine log file directory")?;
    let file_name = path
        .file_name()
        .context("Could not determine log file name")?;

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    // Keep guard alive for entire process
    let _ = LOG_GUARD.set(guard);

    Ok(file_writer)
}

/// Installs the global subscriber: stdout plus the log file, both filtered at `log_level`.
///
/// With the `tokio-console` feature the console subscriber is installed instead.
pub fn init_tracing(log_level: LevelFilter) {
    #[cfg(feature = "tokio-console")]
    {
        let _ = log_level;
        console_subscriber::init();
        return;
    }

    #[cfg(not(feature = "tokio-console"))]
    {
        let stdout_layer = fmt::layer()
            .with_thread_ids(true)
            .with_file(cfg!(debug_assertions))
            .with_line_number(cfg!(debug_assertions))
            .with_target(false)
            .with_ansi(cfg!(debug_assertions))
            .with_filter(log_level);

        match build_file_writer() {
            Ok(writer) => {
                let file_layer = fmt::layer()
                    .with_thread_ids(true)
                    .with_file(cfg!(debug_assertions))
                    .with_line_number(cfg!(debug_assertions))
                    .with_target(false)
                    .with_ansi(false) // no ANSI in file
                    .with_writer(writer)
                    .with_filter(log_level);

                let subscriber = Registry::default().with(stdout_layer).with(file_layer);

                tracing::subscriber::set_global_default(subscriber)
                    .expect("Could not set global tracing subscriber with file logging");
            }
            Err(e) => {
                let subscriber = Registry::default().with(stdout_layer);

                tracing::subscriber::set_global_default(subscriber)
                    .expect("Could not set global tracing subscriber without file logging");

                warn!(
                    "File logging could not be initialized. Falling back to stdout only: {}",
                    e
                );
            }
        }
    }
}
