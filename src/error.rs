// src/error.rs
// Error types for the Lexi client

use thiserror::Error;

/// Main error type for the Lexi client library
#[derive(Error, Debug)]
pub enum LexiError {
    #[error("unauthorized: session token rejected")]
    Unauthorized,

    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("login failed: {0}")]
    Login(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("no generative AI API key configured")]
    MissingApiKey,

    #[error("generative AI error: {0}")]
    GenAi(String),
}

/// Convenience type alias for Result using LexiError
pub type Result<T> = std::result::Result<T, LexiError>;

impl LexiError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::UnexpectedResponse(msg.into())
    }

    /// True when the server rejected the session token
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::Status { status: 401, .. })
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
