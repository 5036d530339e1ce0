//! `[logging]` section
//!
//! Rotation values are checked while the file is parsed, so a typo such as
//! `file_rotation = "dayly"` reaches the config error banner instead of
//! silently picking a schedule.

use serde::Deserialize;
use std::path::PathBuf;

const DEFAULT_LEVEL: &str = "info";
const DEFAULT_DIR: &str = "./logs";
const DEFAULT_PREFIX: &str = "tripsearch";

/// How often the JSON log file rolls over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Hourly,
    #[default]
    Daily,
    /// One file for the life of the process
    Never,
}

impl LogRotation {
    /// Spelling used in the TOML template
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Never => "never",
        }
    }
}

/// Resolved logging settings
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Level for the `tripsearch` target; RUST_LOG replaces the whole filter
    pub level: String,
    /// Mirror events as JSON lines into `file_dir`
    pub file_enabled: bool,
    pub file_dir: PathBuf,
    pub file_rotation: LogRotation,
    /// File name stem, dated by the appender ("tripsearch.2025-01-15")
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL.to_string(),
            file_enabled: false,
            file_dir: PathBuf::from(DEFAULT_DIR),
            file_rotation: LogRotation::default(),
            file_prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

/// `[logging]` as written in the file; every key optional
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct FileLogging {
    pub level: Option<String>,
    pub file_enabled: Option<bool>,
    pub file_dir: Option<PathBuf>,
    pub file_rotation: Option<LogRotation>,
    pub file_prefix: Option<String>,
}

impl LoggingConfig {
    /// Fill the keys the file left out with defaults
    pub fn from_file(section: Option<FileLogging>) -> Self {
        let Some(section) = section else {
            return Self::default();
        };
        let defaults = Self::default();

        Self {
            level: section.level.unwrap_or(defaults.level),
            file_enabled: section.file_enabled.unwrap_or(defaults.file_enabled),
            file_dir: section.file_dir.unwrap_or(defaults.file_dir),
            file_rotation: section.file_rotation.unwrap_or(defaults.file_rotation),
            file_prefix: section.file_prefix.unwrap_or(defaults.file_prefix),
        }
    }
}
