//! Application configuration.
//!
//! Values are layered: compiled-in defaults, then `config.toml` under the
//! user's config directory, then `AUTOPARTS_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// API base URL baked in at build time, falling back to a local server.
pub const DEFAULT_API_URL: &str = match option_env!("AUTOPARTS_API_URL") {
    Some(url) => url,
    None => "http://localhost:8080",
};

/// Prefix for environment overrides (`AUTOPARTS_API_URL`, ...).
pub const ENV_PREFIX: &str = "AUTOPARTS";

const APP_DIR: &str = "autoparts";
const CONFIG_FILE: &str = "config.toml";
const SESSION_FILE: &str = "session.json";

const DEFAULT_CONFIG: &str = r#"# autoparts client configuration

# Base URL of the inventory API. Defaults to the URL the client was built with.
# api_url = "http://localhost:8080"

# Seconds before an API request is abandoned. Unset means wait indefinitely.
# request_timeout_secs = 30

# Endpoint returning the current user's profile, used when login responses
# carry only a token.
# profile_path = "/api/users/me"
"#;

/// Runtime settings for the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the REST API.
    pub api_url: String,
    /// Where the session record is persisted.
    pub session_file: PathBuf,
    /// Per-request timeout; `None` waits until the transport gives up.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    /// Optional endpoint returning the current user's profile.
    #[serde(default)]
    pub profile_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            session_file: default_session_file(),
            request_timeout_secs: None,
            profile_path: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load configuration from `path` (optional) layered over the defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let defaults = Self::default();
        let settings = Config::builder()
            .set_default("api_url", defaults.api_url)?
            .set_default(
                "session_file",
                defaults.session_file.to_string_lossy().to_string(),
            )?
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        settings
            .try_deserialize()
            .context("invalid configuration values")
    }
}

/// Directory holding `config.toml`.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Default configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}

/// Default persisted session location.
pub fn default_session_file() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(SESSION_FILE)
}

/// Write a commented default configuration when none exists.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
api_url = "https://inventory.example.com"
request_timeout_secs = 15
profile_path = "/api/users/me"
"#,
        )?;

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.api_url, "https://inventory.example.com");
        assert_eq!(config.request_timeout_secs, Some(15));
        assert_eq!(config.profile_path.as_deref(), Some("/api/users/me"));
        assert_eq!(config.session_file, default_session_file());
        Ok(())
    }

    #[test]
    fn default_config_is_written_once_and_parses() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("config.toml");
        write_default_config(&path)?;
        fs::write(&path, "api_url = \"http://keep.me\"\n")?;
        write_default_config(&path)?;
        assert_eq!(fs::read_to_string(&path)?, "api_url = \"http://keep.me\"\n");

        let fresh = dir.path().join("fresh.toml");
        write_default_config(&fresh)?;
        let config = AppConfig::load_from(&fresh)?;
        assert_eq!(config.request_timeout_secs, None);
        Ok(())
    }

    #[test]
    fn fresh_default_config_keeps_built_in_api_url() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        write_default_config(&path)?;
        assert!(!fs::read_to_string(&path)?
            .lines()
            .any(|line| line.trim_start().starts_with("api_url")));

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.api_url, DEFAULT_API_URL);
        Ok(())
    }
}
