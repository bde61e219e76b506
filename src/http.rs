// src/http.rs
// Shared HTTP client for the Lexi API and Gemini

use std::time::Duration;

/// Default overall request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default connect timeout
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Create the shared HTTP client with the default timeouts.
pub fn create_shared_client() -> reqwest::Client {
    create_client(DEFAULT_TIMEOUT, CONNECT_TIMEOUT)
}

/// Create an HTTP client with explicit timeouts.
///
/// Built once per `LexiClient` and cloned into every component; reqwest
/// pools connections internally.
pub fn create_client(timeout: Duration, connect_timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(connect_timeout)
        .pool_max_idle_per_host(4)
        .user_agent(concat!("lexi/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_shared_client() {
        let client = create_shared_client();
        drop(client);
    }

    #[test]
    fn test_timeout_values() {
        assert_eq!(DEFAULT_TIMEOUT, Duration::from_secs(60));
        assert_eq!(CONNECT_TIMEOUT, Duration::from_secs(10));
    }
}
