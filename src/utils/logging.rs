//! Diagnostic logging setup.
//!
//! The filter comes from `PURRCHAT_LOG` (default `warn`). The full-screen UI
//! owns the terminal, so it logs to a file in the data directory; one-shot
//! commands log to stderr.

use std::error::Error;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::core::constants::LOG_FILTER_ENV;

const DEFAULT_FILTER: &str = "warn";
const LOG_FILE_NAME: &str = "purrchat.log";

pub enum LogTarget<'a> {
    Stderr,
    FileIn(&'a Path),
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

pub fn log_file_path(data_dir: &Path) -> PathBuf {
    data_dir.join(LOG_FILE_NAME)
}

/// Installs the global subscriber. A second call is a no-op.
pub fn init_tracing(target: LogTarget<'_>) -> Result<(), Box<dyn Error>> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false);

    let installed = match target {
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::FileIn(dir) => {
            fs::create_dir_all(dir)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file_path(dir))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };

    if let Err(err) = installed {
        tracing::debug!(%err, "tracing subscriber already installed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_target_creates_log_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path().join("data");

        init_tracing(LogTarget::FileIn(&dir)).expect("init");
        assert!(log_file_path(&dir).exists());

        init_tracing(LogTarget::Stderr).expect("second init is a no-op");
    }
}
