//! Configuration for the tripsearch client
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/tripsearch/config.toml)
//! 3. Built-in defaults (lowest priority)

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::csrf_token_from_cookie;
use crate::dates::DEFAULT_TRAVEL_WINDOW_DAYS;
use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::session::emails::RECENT_EMAIL_CAP;
use crate::suggest::{PROVINCE_DELAY, QUICK_SEARCH_DELAY};

// ─────────────────────────────────────────────────────────────────────────────
// Submodules
// ─────────────────────────────────────────────────────────────────────────────

mod observability;
mod serialization;


pub use observability::{FileLogging, LogRotation, LoggingConfig};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

// The controllers own their defaults; the config only mirrors them
const DEFAULT_QUICK_SEARCH_DELAY_MS: u64 = QUICK_SEARCH_DELAY.as_millis() as u64;
const DEFAULT_PROVINCE_DELAY_MS: u64 = PROVINCE_DELAY.as_millis() as u64;

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Site root the API paths are appended to
    pub base_url: String,

    /// Per-request timeout
    pub request_timeout_secs: u64,

    /// Quiet period before a quick-search request
    pub quick_search_delay_ms: u64,

    /// Quiet period before a province request
    pub province_delay_ms: u64,

    /// How many entries the history section asks for
    pub history_limit: usize,

    /// How many login emails are remembered
    pub recent_email_cap: usize,

    /// Days ahead the travel date may be set
    pub travel_window_days: u64,

    /// JSON file standing in for the browser's local storage
    pub storage_path: PathBuf,

    /// Sent as X-CSRFToken on history deletions. Taken from
    /// TRIPSEARCH_COOKIE's `csrftoken` when not set directly.
    pub csrf_token: Option<String>,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            quick_search_delay_ms: DEFAULT_QUICK_SEARCH_DELAY_MS,
            province_delay_ms: DEFAULT_PROVINCE_DELAY_MS,
            history_limit: DEFAULT_HISTORY_LIMIT,
            recent_email_cap: RECENT_EMAIL_CAP,
            travel_window_days: DEFAULT_TRAVEL_WINDOW_DAYS,
            storage_path: Self::default_storage_path(),
            csrf_token: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn quick_search_delay(&self) -> Duration {
        Duration::from_millis(self.quick_search_delay_ms)
    }

    pub fn province_delay(&self) -> Duration {
        Duration::from_millis(self.province_delay_ms)
    }

    /// `<data_dir>/tripsearch/storage.json`, or the working directory when
    /// the platform has no data dir
    pub fn default_storage_path() -> PathBuf {
        dirs::data_dir()
            .map(|p| p.join("tripsearch"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("storage.json")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Configuration (deserialization layer)
// ─────────────────────────────────────────────────────────────────────────────

/// Config file structure
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    pub base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub quick_search_delay_ms: Option<u64>,
    pub province_delay_ms: Option<u64>,
    pub history_limit: Option<usize>,
    pub recent_email_cap: Option<usize>,
    pub travel_window_days: Option<u64>,
    pub storage_path: Option<String>,
    pub csrf_token: Option<String>,

    /// Optional [logging] section
    pub logging: Option<FileLogging>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Get the config file path: ~/.config/tripsearch/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("tripsearch").join("config.toml"))
    }

    /// Create config file with defaults if it doesn't exist
    /// Called during startup to help users discover configuration options
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };

        if path.exists() {
            return;
        }

        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return; // Silently fail - config is optional
            }
        }

        // Config::default().to_toml() is the single source of truth
        let _ = std::fs::write(&path, Self::default().to_toml());
    }

    /// Parse a config file. A missing file is an empty config.
    pub(crate) fn read_file(path: &Path) -> Result<FileConfig> {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileConfig::default()),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    /// Load file config if it exists
    ///
    /// Exits the process if the file exists but cannot be parsed: a broken
    /// config should fail fast with a clear error, not silently fall back to
    /// defaults while the user debugs the wrong thing.
    fn load_file_config() -> FileConfig {
        let Some(path) = Self::config_path() else {
            return FileConfig::default();
        };

        match Self::read_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("\n╔══════════════════════════════════════════════════════════════╗");
                eprintln!("║  CONFIG ERROR - Failed to load configuration file           ║");
                eprintln!("╚══════════════════════════════════════════════════════════════╝\n");
                eprintln!("  File: {}\n", path.display());
                eprintln!("  Error: {:#}\n", e);
                eprintln!("  Tip: Check for:\n");
                eprintln!("    - Missing quotes around string values");
                eprintln!("    - Numbers written as strings (use 300, not \"300\")");
                eprintln!("    - Typos in section names\n");
                eprintln!("  To reset, run `tripsearch config --reset`.\n");
                std::process::exit(1);
            }
        }
    }

    /// Load configuration: env vars > file > defaults
    pub fn from_env() -> Self {
        let file = Self::load_file_config();
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Merge file values with environment overrides and defaults
    pub(crate) fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let env_parsed = |key: &str| env(key).and_then(|v| v.trim().parse().ok());

        // Backend URL: env > file > default
        let base_url = env("TRIPSEARCH_BASE_URL")
            .or(file.base_url)
            .unwrap_or(defaults.base_url);

        let request_timeout_secs = env_parsed("TRIPSEARCH_TIMEOUT_SECS")
            .or(file.request_timeout_secs)
            .unwrap_or(defaults.request_timeout_secs);

        // Debounce delays: file > default
        let quick_search_delay_ms = file
            .quick_search_delay_ms
            .unwrap_or(defaults.quick_search_delay_ms);
        let province_delay_ms = file
            .province_delay_ms
            .unwrap_or(defaults.province_delay_ms);

        let history_limit = file.history_limit.unwrap_or(defaults.history_limit);
        let recent_email_cap = file.recent_email_cap.unwrap_or(defaults.recent_email_cap);
        let travel_window_days = file
            .travel_window_days
            .unwrap_or(defaults.travel_window_days);

        // Storage file: env > file > default
        let storage_path = env("TRIPSEARCH_STORAGE")
            .or(file.storage_path)
            .map(PathBuf::from)
            .unwrap_or(defaults.storage_path);

        // CSRF token: env > file > csrftoken cookie from a pasted Cookie header
        let csrf_token = env("TRIPSEARCH_CSRF_TOKEN")
            .or(file.csrf_token)
            .filter(|t| !t.is_empty())
            .or_else(|| {
                env("TRIPSEARCH_COOKIE")
                    .as_deref()
                    .and_then(csrf_token_from_cookie)
            })
            .filter(|t| !t.is_empty());

        let logging = LoggingConfig::from_file(file.logging);

        Self {
            base_url,
            request_timeout_secs,
            quick_search_delay_ms,
            province_delay_ms,
            history_limit,
            recent_email_cap,
            travel_window_days,
            storage_path,
            csrf_token,
            logging,
        }
    }
}
