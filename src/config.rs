//! Configuration for the PolicyIntel client.
//!
//! Settings come from an optional TOML file under the user config directory,
//! overridden by environment variables. A `.env` file is honored because it
//! is loaded before settings are read (see `main.rs`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default API base URL (the development backend).
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Default per-request timeout. Analysis calls an LLM server-side and can be
/// slow, so this is generous.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// API base URL, e.g. `https://policyintel.example.com`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Where the durable session token lives. Defaults to
    /// `<config dir>/policyintel/token`.
    #[serde(default)]
    pub token_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            token_file: None,
        }
    }
}

impl Settings {
    /// Load settings from `path` (or the default config file location),
    /// then apply environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_file(),
        };

        let mut settings = match path {
            Some(ref p) if p.exists() => {
                let raw = std::fs::read_to_string(p)?;
                toml::from_str(&raw)
                    .map_err(|e| anyhow::anyhow!("invalid config file {}: {}", p.display(), e))?
            }
            _ => Settings::default(),
        };

        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Override file-based settings from the environment.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("POLICYINTEL_API_URL") {
            if !url.is_empty() {
                self.base_url = url;
            }
        }
        if let Ok(secs) = std::env::var("POLICYINTEL_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                self.timeout_secs = secs;
            }
        }
        if let Ok(file) = std::env::var("POLICYINTEL_TOKEN_FILE") {
            if !file.is_empty() {
                self.token_file = Some(PathBuf::from(file));
            }
        }
    }

    /// Path of the durable token store.
    pub fn token_path(&self) -> PathBuf {
        match &self.token_file {
            Some(p) => p.clone(),
            None => config_dir().join("token"),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("policyintel")
}

fn default_config_file() -> Option<PathBuf> {
    Some(config_dir().join("config.toml"))
}
