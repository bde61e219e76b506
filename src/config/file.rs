// src/config/file.rs
// File-based configuration from ~/.lexi/config.toml

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Top-level config structure
#[derive(Debug, Deserialize, Default)]
pub struct LexiConfigFile {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub genai: GenAiSection,
    #[serde(default)]
    pub session: SessionSection,
}

/// `[api]` section
#[derive(Debug, Deserialize, Default)]
pub struct ApiSection {
    pub base_url: Option<String>,
    pub port: Option<u16>,
    pub request_timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
}

/// `[genai]` section
#[derive(Debug, Deserialize, Default)]
pub struct GenAiSection {
    pub model: Option<String>,
    pub base_url: Option<String>,
}

/// `[session]` section
#[derive(Debug, Deserialize, Default)]
pub struct SessionSection {
    pub persist: Option<bool>,
    pub file: Option<PathBuf>,
    pub login_redirect_ms: Option<u64>,
}

impl LexiConfigFile {
    /// Load config from ~/.lexi/config.toml
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    /// Load config from an explicit path, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    debug!(path = %path.display(), "Loaded config from file");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to parse config file");
                    Self::default()
                }
            },
            Err(_) => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
        }
    }
}

/// The ~/.lexi directory
pub fn lexi_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".lexi")
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    lexi_dir().join("config.toml")
}
