use crate::infrastructure::error::InfraError;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const COMMAND_LOG: &str = "commands.log";
const DEFAULT_FILTER: &str = "info";

pub fn command_log_path(logs_dir: &Path) -> PathBuf {
    logs_dir.join(COMMAND_LOG)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs a JSON-lines subscriber appending to `logs/commands.log`.
///
/// Returns `false` when another global subscriber was installed first.
pub fn init_logging(logs_dir: &Path) -> Result<bool, InfraError> {
    fs::create_dir_all(logs_dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(command_log_path(logs_dir))?;

    let installed = tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter())
        .with_target(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .is_ok();
    Ok(installed)
}
