// src/lib.rs
// Lexi - session, settings sync and tutor chat client for the Lexi language-learning API

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod genai;
pub mod http;
pub mod navigation;
pub mod session;
pub mod user;

pub use client::LexiClient;
pub use config::ClientConfig;
pub use error::{LexiError, Result};
pub use navigation::{ChannelNavigator, LogNavigator, Navigator, Route};
