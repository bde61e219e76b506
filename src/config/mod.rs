// src/config/mod.rs
// Configuration: environment + ~/.lexi/config.toml resolved into ClientConfig

pub mod env;
pub mod file;

pub use env::{ConfigValidation, EnvConfig};
pub use file::{LexiConfigFile, config_path, lexi_dir};

use crate::error::{LexiError, Result};
use crate::genai::{DEFAULT_GEMINI_BASE_URL, DEFAULT_MODEL};
use crate::http::{CONNECT_TIMEOUT, DEFAULT_TIMEOUT};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Default Lexi API location when nothing is configured
pub const DEFAULT_API_URL: &str = "http://localhost";

/// Default pause between a successful login and the redirect to the tutor view
pub const DEFAULT_LOGIN_REDIRECT: Duration = Duration::from_millis(1000);

/// Fully resolved client configuration
#[derive(Clone)]
pub struct ClientConfig {
    pub api_url: String,
    /// Overrides the port of `api_url` when set
    pub api_port: Option<u16>,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    /// Where the session token is persisted; `None` keeps it in memory only
    pub session_file: Option<PathBuf>,
    pub login_redirect_delay: Duration,
}

impl ClientConfig {
    /// In-memory configuration pointing at `api_url`, everything else defaulted
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_port: None,
            request_timeout: DEFAULT_TIMEOUT,
            connect_timeout: CONNECT_TIMEOUT,
            gemini_api_key: None,
            gemini_model: DEFAULT_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            session_file: None,
            login_redirect_delay: DEFAULT_LOGIN_REDIRECT,
        }
    }

    /// Load from ~/.lexi/config.toml and the environment (env wins)
    pub fn load() -> Self {
        Self::resolve(&LexiConfigFile::load(), &EnvConfig::from_env())
    }

    /// Merge file and environment values over the defaults
    pub fn resolve(file: &LexiConfigFile, env: &EnvConfig) -> Self {
        let api_url = env
            .api_url
            .clone()
            .or_else(|| file.api.base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let persist = env.persist_session.or(file.session.persist).unwrap_or(true);
        let session_file = persist.then(|| {
            env.session_file
                .clone()
                .or_else(|| file.session.file.clone())
                .unwrap_or_else(default_session_file)
        });

        Self {
            api_url,
            api_port: env.api_port.or(file.api.port),
            request_timeout: env
                .request_timeout_secs
                .or(file.api.request_timeout_secs)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
            connect_timeout: env
                .connect_timeout_secs
                .or(file.api.connect_timeout_secs)
                .map(Duration::from_secs)
                .unwrap_or(CONNECT_TIMEOUT),
            gemini_api_key: env.gemini_api_key.clone(),
            gemini_model: env
                .gemini_model
                .clone()
                .or_else(|| file.genai.model.clone())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_base_url: env
                .gemini_base_url
                .clone()
                .or_else(|| file.genai.base_url.clone())
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            session_file,
            login_redirect_delay: env
                .login_redirect_ms
                .or(file.session.login_redirect_ms)
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_LOGIN_REDIRECT),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.api_port = Some(port);
        self
    }

    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = Some(path.into());
        self
    }

    pub fn with_login_redirect_delay(mut self, delay: Duration) -> Self {
        self.login_redirect_delay = delay;
        self
    }

    pub fn with_gemini(mut self, api_key: Option<String>, base_url: impl Into<String>) -> Self {
        self.gemini_api_key = api_key;
        self.gemini_base_url = base_url.into();
        self
    }

    /// `scheme://host[:port][/path]` without a trailing slash; endpoint
    /// paths are appended to this verbatim.
    pub fn api_base_url(&self) -> Result<String> {
        let mut url = Url::parse(&self.api_url)?;
        if let Some(port) = self.api_port {
            url.set_port(Some(port))
                .map_err(|_| LexiError::Config(format!("cannot set a port on {}", self.api_url)))?;
        }
        Ok(url.as_str().trim_end_matches('/').to_string())
    }

    /// Check the configuration for problems worth reporting
    pub fn validate(&self) -> ConfigValidation {
        let mut validation = ConfigValidation::new();

        if let Err(e) = self.api_base_url() {
            validation.add_error(format!("LEXI_API_URL is not usable: {}", e));
        }
        if Url::parse(&self.gemini_base_url).is_err() {
            validation.add_error(format!(
                "Gemini base URL is not a valid URL: {}",
                self.gemini_base_url
            ));
        }
        if self.gemini_api_key.is_none() {
            validation.add_warning(
                "No GEMINI_API_KEY set; the tutor chat needs an API key in your Lexi settings",
            );
        }
        if self.session_file.is_none() {
            validation.add_warning("Session persistence disabled; logins last one process only");
        }

        validation
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("api_port", &self.api_port)
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<redacted>"))
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("session_file", &self.session_file)
            .field("login_redirect_delay", &self.login_redirect_delay)
            .finish()
    }
}

/// ~/.lexi/session.json
pub fn default_session_file() -> PathBuf {
    lexi_dir().join("session.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults() {
        let config = ClientConfig::new("http://localhost");
        assert_eq!(config.gemini_model, DEFAULT_MODEL);
        assert!(config.session_file.is_none());
        assert_eq!(config.login_redirect_delay, DEFAULT_LOGIN_REDIRECT);
    }

    #[test]
    fn test_api_base_url_with_port() {
        let config = ClientConfig::new("http://localhost").with_port(3000);
        assert_eq!(config.api_base_url().unwrap(), "http://localhost:3000");
    }

    #[test]
    fn test_api_base_url_without_port() {
        let config = ClientConfig::new("https://api.lexi.example/");
        assert_eq!(config.api_base_url().unwrap(), "https://api.lexi.example");
    }

    #[test]
    fn test_api_base_url_keeps_path_prefix() {
        let config = ClientConfig::new("http://127.0.0.1:8080/lexi");
        assert_eq!(config.api_base_url().unwrap(), "http://127.0.0.1:8080/lexi");
    }

    #[test]
    fn test_api_base_url_invalid() {
        let config = ClientConfig::new("localhost without scheme");
        assert!(config.api_base_url().is_err());
        assert!(!config.validate().is_valid());
    }

    #[test]
    fn test_resolve_env_over_file() {
        let file: LexiConfigFile = toml::from_str(
            r#"
[api]
base_url = "http://file-host"
port = 4000

[genai]
model = "file-model"
"#,
        )
        .unwrap();
        let env = EnvConfig {
            api_url: Some("http://env-host".to_string()),
            persist_session: Some(false),
            ..Default::default()
        };

        let config = ClientConfig::resolve(&file, &env);
        assert_eq!(config.api_url, "http://env-host");
        assert_eq!(config.api_port, Some(4000));
        assert_eq!(config.gemini_model, "file-model");
        assert!(config.session_file.is_none());
    }

    #[test]
    fn test_resolve_defaults_persist_session() {
        let config = ClientConfig::resolve(&LexiConfigFile::default(), &EnvConfig::default());
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.session_file, Some(default_session_file()));
        assert_eq!(config.request_timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_validate_warns_without_gemini_key() {
        let validation = ClientConfig::new("http://localhost").validate();
        assert!(validation.is_valid());
        assert!(validation.warnings.iter().any(|w| w.contains("GEMINI_API_KEY")));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ClientConfig::new("http://localhost")
            .with_gemini(Some("hidden-key".to_string()), DEFAULT_GEMINI_BASE_URL);
        assert!(!format!("{:?}", config).contains("hidden-key"));
    }
}
