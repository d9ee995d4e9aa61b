use std::path::PathBuf;
use std::sync::Mutex;

use color_eyre::Result;
use lazy_static::lazy_static;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt, prelude::*};

use crate::config;

lazy_static! {
    pub static ref LOG_ENV: String = format!("{}_LOGLEVEL", config::PROJECT_NAME.clone());
    pub static ref LOG_FILE: String = format!("{}.log", env!("CARGO_PKG_NAME"));
}

#[cfg(debug_assertions)]
const DEFAULT_LEVEL: LevelFilter = LevelFilter::INFO;

#[cfg(not(debug_assertions))]
const DEFAULT_LEVEL: LevelFilter = LevelFilter::WARN;

// Dropping the guard flushes the background writer.
static GUARD: Mutex<Option<WorkerGuard>> = Mutex::new(None);

pub fn log_path() -> PathBuf {
    config::get_data_dir().join(LOG_FILE.as_str())
}

/// Log to `<data dir>/wizard.log` through a non-blocking writer. The terminal
/// belongs to the UI, so there is no console layer.
///
/// Filter comes from `RUST_LOG`, falling back to `WIZARD_LOGLEVEL`, then the
/// build default (info in debug builds, warn in release).
pub fn init() -> Result<()> {
    let directory = config::get_data_dir();
    std::fs::create_dir_all(&directory)?;

    let file_appender = tracing_appender::rolling::never(&directory, LOG_FILE.as_str());
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::builder().with_default_directive(DEFAULT_LEVEL.into());
    let env_filter = env_filter
        .try_from_env()
        .or_else(|_| env_filter.with_env_var(LOG_ENV.clone()).from_env())?;

    let file_layer = fmt::Layer::default()
        .with_target(false)
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(non_blocking)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(ErrorLayer::default())
        .try_init()?;

    if let Ok(mut slot) = GUARD.lock() {
        *slot = Some(guard);
    }
    Ok(())
}

/// Write out everything still buffered. Called on exit and from the panic
/// hook, which leaves through `process::exit` and skips destructors.
pub fn flush() {
    if let Ok(mut slot) = GUARD.lock() {
        slot.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn log_file_lives_in_the_data_dir() {
        let path = log_path();
        assert_eq!(path.parent(), Some(config::get_data_dir().as_path()));
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("wizard.log"));
        assert_eq!(LOG_ENV.as_str(), "WIZARD_LOGLEVEL");
    }

    #[test]
    fn flush_without_init_is_harmless() {
        flush();
        flush();
    }
}
