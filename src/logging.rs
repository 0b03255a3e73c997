//! Tracing subscriber setup.

use std::fs::File;
use std::io;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Installs the global `fmt` subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`. With `config.file` set,
/// events are appended to that file instead of stderr.
///
/// # Errors
///
/// Returns an `io::Error` if the log file cannot be opened.
pub fn init_tracing(config: &LoggingConfig) -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    // try_init fails only if a subscriber is already set, which is harmless
    match &config.file {
        Some(path) => {
            let file = File::options().create(true).append(true).open(path)?;
            let _ = builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = builder.with_writer(io::stderr).try_init();
        }
    }
    Ok(())
}
