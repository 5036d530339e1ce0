//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::Config;

impl Config {
    /// Serialize config to TOML string (single source of truth for format)
    pub fn to_toml(&self) -> String {
        format!(
            r#"# tripsearch configuration

# Site root; API paths such as /api/search/ are appended to it
base_url = "{base_url}"

# Per-request timeout (seconds)
request_timeout_secs = {timeout}

# Quiet period after the last keystroke before a request is sent (milliseconds)
quick_search_delay_ms = {quick_delay}
province_delay_ms = {province_delay}

# Entries shown in the search-history section
history_limit = {history_limit}

# Login emails remembered for the email dropdown
recent_email_cap = {email_cap}

# Days ahead the travel date may be set
travel_window_days = {window_days}

# Local storage file (tokens, user, recent emails)
storage_path = "{storage_path}"

# CSRF token sent on history deletions. Without it, the csrftoken cookie in
# TRIPSEARCH_COOKIE (a browser Cookie header) is used.
{csrf_token}
# ─────────────────────────────────────────────────────────────────────────────
# LOGGING
# ─────────────────────────────────────────────────────────────────────────────
# RUST_LOG overrides level when set.

[logging]
level = "{log_level}"
file_enabled = {log_file_enabled}
file_dir = "{log_file_dir}"
file_rotation = "{log_file_rotation}"     # hourly, daily, never
file_prefix = "{log_file_prefix}"
"#,
            base_url = escape(&self.base_url),
            timeout = self.request_timeout_secs,
            quick_delay = self.quick_search_delay_ms,
            province_delay = self.province_delay_ms,
            history_limit = self.history_limit,
            email_cap = self.recent_email_cap,
            window_days = self.travel_window_days,
            storage_path = escape(&self.storage_path.display().to_string()),
            csrf_token = self
                .csrf_token
                .as_ref()
                .map(|t| format!("csrf_token = \"{}\"\n", escape(t)))
                .unwrap_or_else(|| "# csrf_token = \"...\"\n".to_string()),
            log_level = self.logging.level,
            log_file_enabled = self.logging.file_enabled,
            log_file_dir = escape(&self.logging.file_dir.display().to_string()),
            log_file_rotation = self.logging.file_rotation.as_str(),
            log_file_prefix = escape(&self.logging.file_prefix),
        )
    }

    /// Save current configuration to file
    pub fn save(&self) -> Result<(), std::io::Error> {
        let Some(path) = Self::config_path() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config path",
            ));
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&path, self.to_toml())
    }
}

/// Escape a value for a TOML basic string (Windows paths carry backslashes)
fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
