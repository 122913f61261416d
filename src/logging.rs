//! Tracing setup: human-readable lines on stderr (stdout carries the run
//! summary) and JSON lines in a daily-rolling file.

use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Overrides the directory of the JSON log files
pub const LOG_DIR_ENV: &str = "ALUMNI_LOG_DIR";
const DEFAULT_LOG_DIR: &str = "logs";
const LOG_FILE_PREFIX: &str = "alumni_agenda.log";

const DEFAULT_DIRECTIVES: &str = "alumni_agenda=info,warn";
const VERBOSE_DIRECTIVES: &str = "alumni_agenda=debug,warn";

/// Log directory from an optional override, `logs` when unset or blank
pub fn log_dir(override_dir: Option<String>) -> PathBuf {
    override_dir
        .filter(|d| !d.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR))
}

/// Filter from explicit directives (usually `RUST_LOG`). Missing or invalid
/// directives fall back to the crate default, raised to debug with `verbose`.
pub fn build_filter(directives: Option<&str>, verbose: bool) -> EnvFilter {
    let fallback = if verbose { VERBOSE_DIRECTIVES } else { DEFAULT_DIRECTIVES };
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(fallback))
}

/// Install the global subscriber. The returned guard flushes the file writer
/// on drop and must live until the end of `main`; it is `None` when the log
/// directory cannot be created, in which case only stderr is written.
pub fn init_logging(verbose: bool) -> Option<WorkerGuard> {
    let filter = build_filter(std::env::var("RUST_LOG").ok().as_deref(), verbose);
    let console_layer = fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr);

    let dir = log_dir(std::env::var(LOG_DIR_ENV).ok());
    let (file_layer, guard) = match fs::create_dir_all(&dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        Err(e) => {
            eprintln!("Log directory {} unavailable ({}), logging to stderr only", dir.display(), e);
            (None, None)
        }
    };

    // A second call (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();
    guard
}
