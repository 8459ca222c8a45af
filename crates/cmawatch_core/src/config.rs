//! Runtime configuration resolved from the environment.
//!
//! # Invariants
//! - Business rules (warning window, refresh interval, task id) are constants
//!   and never read from here.
//! - An empty or whitespace-only variable counts as unset.

use crate::logging::LogLevel;
use std::path::{Path, PathBuf};

/// Directory holding the roster file and logs.
pub const DATA_DIR_ENV: &str = "CMAWATCH_DATA_DIR";
/// Log level override (`trace|debug|info|warn|error`).
pub const LOG_LEVEL_ENV: &str = "CMAWATCH_LOG_LEVEL";
/// File name kept for compatibility with previously persisted rosters.
pub const ROSTER_FILE_NAME: &str = "pessoas.json";

const DEFAULT_DATA_DIR_NAME: &str = "cmawatch";
const LOG_DIR_NAME: &str = "logs";

/// Resolved core configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub data_dir: PathBuf,
    pub log_level: LogLevel,
}

impl CoreConfig {
    /// Configuration rooted at `data_dir` with the build-mode log level.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            log_level: LogLevel::build_default(),
        }
    }

    /// Reads `CMAWATCH_DATA_DIR` and `CMAWATCH_LOG_LEVEL`.
    ///
    /// Falls back to `<tmp>/cmawatch` and the build-mode level; an invalid
    /// level also falls back.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let data_dir = non_blank(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DATA_DIR_NAME));
        let log_level = non_blank(LOG_LEVEL_ENV)
            .and_then(|value| LogLevel::parse(&value).ok())
            .unwrap_or_else(LogLevel::build_default);

        Self {
            data_dir,
            log_level,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Location of the persisted roster.
    pub fn roster_path(&self) -> PathBuf {
        self.data_dir.join(ROSTER_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join(LOG_DIR_NAME)
    }
}
