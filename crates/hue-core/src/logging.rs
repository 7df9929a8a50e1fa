//! Log setup for the in-game plugin

use crate::error::{Error, Result};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log file name inside the data directory
pub const LOG_FILE_NAME: &str = "HueZh.log";

/// Map a configured level to a filter directive.
///
/// Accepts the tracing names plus `warning`, `verbose` and `fine`.
/// Anything unrecognised means `info`.
pub fn level_directive(level: &str) -> &'static str {
    match level.trim().to_ascii_lowercase().as_str() {
        "off" => "off",
        "error" => "error",
        "warn" | "warning" => "warn",
        "debug" | "verbose" | "fine" => "debug",
        "trace" => "trace",
        _ => "info",
    }
}

/// Filter for a configured level
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::new(level_directive(level))
}

/// Send logs to a fresh file at `path`.
///
/// Only the first call in a process installs a subscriber. Once any
/// global subscriber exists, later calls leave `path` untouched.
pub fn init_file_logging(path: &Path, level: &str) -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }
    let file = File::create(path).map_err(|e| Error::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    let installed = tracing_subscriber::registry()
        .with(env_filter(level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(
            "HueZh {} initiated, log level {}",
            env!("CARGO_PKG_VERSION"),
            level_directive(level)
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_directive() {
        assert_eq!(level_directive("Verbose"), "debug");
        assert_eq!(level_directive("fine"), "debug");
        assert_eq!(level_directive(" WARNING "), "warn");
        assert_eq!(level_directive("off"), "off");
        assert_eq!(level_directive("loud"), "info");
    }

    #[test]
    fn test_second_init_keeps_existing_log() {
        let dir = tempfile::tempdir().unwrap();
        init_file_logging(&dir.path().join(LOG_FILE_NAME), "info").unwrap();

        let other = dir.path().join("other.log");
        std::fs::write(&other, "earlier run").unwrap();
        init_file_logging(&other, "debug").unwrap();

        assert_eq!(std::fs::read_to_string(&other).unwrap(), "earlier run");
    }
}
