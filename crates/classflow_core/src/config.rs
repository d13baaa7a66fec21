//! Runtime configuration resolved from the environment.
//!
//! # Invariants
//! - Blank environment values behave as unset.
//! - Explicit overrides always win over the environment.

use crate::logging::{default_log_level, LogLevel, LoggingError};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "CLASSFLOW_DB_PATH";
pub const LOG_DIR_ENV: &str = "CLASSFLOW_LOG_DIR";
pub const LOG_LEVEL_ENV: &str = "CLASSFLOW_LOG_LEVEL";
const DEFAULT_DB_FILE_NAME: &str = "classflow.sqlite3";

/// Settings shared by every entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    /// Logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    pub log_level: LogLevel,
}

impl CoreConfig {
    /// Resolves configuration from process environment variables.
    pub fn from_env() -> Result<Self, LoggingError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LoggingError> {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = non_blank(DB_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));
        let log_level = match non_blank(LOG_LEVEL_ENV) {
            Some(raw) => raw.parse()?,
            None => default_log_level(),
        };

        Ok(Self {
            db_path,
            log_dir: non_blank(LOG_DIR_ENV).map(PathBuf::from),
            log_level,
        })
    }

    /// Applies caller-provided overrides on top of resolved values.
    pub fn with_overrides(
        mut self,
        db_path: Option<PathBuf>,
        log_dir: Option<PathBuf>,
        log_level: Option<LogLevel>,
    ) -> Self {
        if let Some(db_path) = db_path {
            self.db_path = db_path;
        }
        if log_dir.is_some() {
            self.log_dir = log_dir;
        }
        if let Some(log_level) = log_level {
            self.log_level = log_level;
        }
        self
    }
}
