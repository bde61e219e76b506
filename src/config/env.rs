// src/config/env.rs
// Environment-based configuration - every LEXI_* variable is read here

use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, warn};

/// Values read from the environment. `None` means "not set or unusable".
#[derive(Clone, Default)]
pub struct EnvConfig {
    /// LEXI_API_URL
    pub api_url: Option<String>,
    /// LEXI_API_PORT
    pub api_port: Option<u16>,
    /// LEXI_REQUEST_TIMEOUT_SECS
    pub request_timeout_secs: Option<u64>,
    /// LEXI_CONNECT_TIMEOUT_SECS
    pub connect_timeout_secs: Option<u64>,
    /// GEMINI_API_KEY, falling back to GOOGLE_AI_STUDIO_API_KEY
    pub gemini_api_key: Option<String>,
    /// LEXI_GEMINI_MODEL
    pub gemini_model: Option<String>,
    /// LEXI_GEMINI_BASE_URL
    pub gemini_base_url: Option<String>,
    /// LEXI_SESSION_FILE
    pub session_file: Option<PathBuf>,
    /// LEXI_PERSIST_SESSION
    pub persist_session: Option<bool>,
    /// LEXI_LOGIN_REDIRECT_MS
    pub login_redirect_ms: Option<u64>,
}

impl EnvConfig {
    /// Load from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary lookup function (tests pass a map here)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let gemini_api_key = read("GEMINI_API_KEY").or_else(|| read("GOOGLE_AI_STUDIO_API_KEY"));
        if gemini_api_key.is_some() {
            debug!("Gemini API key found in environment");
        }

        Self {
            api_url: read("LEXI_API_URL"),
            api_port: parse_var("LEXI_API_PORT", read("LEXI_API_PORT")),
            request_timeout_secs: parse_var(
                "LEXI_REQUEST_TIMEOUT_SECS",
                read("LEXI_REQUEST_TIMEOUT_SECS"),
            ),
            connect_timeout_secs: parse_var(
                "LEXI_CONNECT_TIMEOUT_SECS",
                read("LEXI_CONNECT_TIMEOUT_SECS"),
            ),
            gemini_api_key,
            gemini_model: read("LEXI_GEMINI_MODEL"),
            gemini_base_url: read("LEXI_GEMINI_BASE_URL"),
            session_file: read("LEXI_SESSION_FILE").map(PathBuf::from),
            persist_session: read("LEXI_PERSIST_SESSION").and_then(|v| {
                let parsed = parse_bool(&v);
                if parsed.is_none() {
                    warn!(value = %v, "Invalid LEXI_PERSIST_SESSION, ignoring");
                }
                parsed
            }),
            login_redirect_ms: parse_var("LEXI_LOGIN_REDIRECT_MS", read("LEXI_LOGIN_REDIRECT_MS")),
        }
    }
}

// Keys never reach Debug output
impl std::fmt::Debug for EnvConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvConfig")
            .field("api_url", &self.api_url)
            .field("api_port", &self.api_port)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<redacted>"))
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("session_file", &self.session_file)
            .field("persist_session", &self.persist_session)
            .field("login_redirect_ms", &self.login_redirect_ms)
            .finish()
    }
}

/// Parse a boolean the way people write them in .env files
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_var<T: FromStr>(key: &str, value: Option<String>) -> Option<T> {
    let value = value?;
    // Allow trailing comments: LEXI_API_PORT=3000 # dev server
    let clean = value.split('#').next().unwrap_or("").trim();
    match clean.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %value, "Invalid value, using default");
            None
        }
    }
}

/// Configuration validation result
#[derive(Debug, Default)]
pub struct ConfigValidation {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ConfigValidation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    /// Format as a human-readable report
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        if !self.errors.is_empty() {
            lines.push("Errors:".to_string());
            for err in &self.errors {
                lines.push(format!("  - {}", err));
            }
        }

        if !self.warnings.is_empty() {
            lines.push("Warnings:".to_string());
            for warn in &self.warnings {
                lines.push(format!("  - {}", warn));
            }
        }

        if lines.is_empty() {
            "Configuration OK".to_string()
        } else {
            lines.join("\n")
        }
    }
}
