// src/api/mod.rs
// Request wrapper for the Lexi API: bearer injection, verb selection, 401 policy

pub mod endpoints;

use crate::error::{LexiError, Result};
use crate::session::Session;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// A decoded API response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    /// JSON body; `Null` when empty, a JSON string when the body was not JSON
    pub body: Value,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.body.clone())?)
    }

    /// Top-level field of an object body, ignoring explicit nulls
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.body.get(name).filter(|v| !v.is_null())
    }

    /// Best human-readable message in an error body
    pub fn error_message(&self) -> String {
        error_message(&self.body, self.status)
    }
}

/// Pull `message` or `error` out of an error body, falling back to the status text
pub fn error_message(body: &Value, status: StatusCode) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .or_else(|| body.get("error").and_then(Value::as_str))
        .or_else(|| body.as_str().filter(|s| !s.trim().is_empty()))
        .map(str::to_string)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        })
}

/// HTTP client bound to one Lexi API base URL and one session
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<Session>,
}

impl ApiClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, session: Arc<Session>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and apply the 401 policy.
    ///
    /// A 401 on a request that carried a token ends the session (token and
    /// flag cleared, redirect to login) and yields `Unauthorized`.
    pub async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<ApiResponse> {
        self.send_with_headers(method, path, body, HeaderMap::new()).await
    }

    pub async fn send_with_headers(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        headers: HeaderMap,
    ) -> Result<ApiResponse> {
        let had_token = self.session.has_token();
        let response = self.execute(method.clone(), path, body, headers).await?;

        if response.status.is_success() {
            return Ok(response);
        }

        if response.status == StatusCode::UNAUTHORIZED {
            if had_token {
                error!(method = %method, path, "Invalid token, redirecting to login");
                self.session.logout();
            } else {
                warn!(method = %method, path, "Unauthorized request without a session token");
            }
            return Err(LexiError::Unauthorized);
        }

        let message = response.error_message();
        error!(
            method = %method,
            path,
            status = response.status.as_u16(),
            body = %response.body,
            "API request failed"
        );
        Err(LexiError::Status {
            status: response.status.as_u16(),
            message,
        })
    }

    /// Send a request without the 401 policy. Any HTTP status comes back as
    /// `Ok`; only transport failures are errors.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        headers: HeaderMap,
    ) -> Result<ApiResponse> {
        let request_id = Uuid::new_v4().to_string();
        let url = self.url(path);

        let mut request = self.http.request(method.clone(), &url);

        if let Some(token) = self.session.token() {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| LexiError::invalid_input("session token is not a valid header value"))?;
            request = request.header(AUTHORIZATION, value);
        }
        // Caller headers go last so they can override Authorization
        request = request.headers(headers);

        // GET and DELETE never carry a payload
        let sends_body = !matches!(method, Method::GET | Method::DELETE);
        if let (true, Some(body)) = (sends_body, body) {
            request = request.json(body);
        }

        debug!(request_id = %request_id, method = %method, path, "Lexi API request");

        let response = request.send().await.map_err(|e| {
            warn!(request_id = %request_id, path, error = %e, "Network error");
            LexiError::Http(e)
        })?;

        let status = response.status();
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        debug!(request_id = %request_id, status = status.as_u16(), "Lexi API response");

        Ok(ApiResponse { status, body })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(Method::GET, path, None).await?.json()
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(Method::DELETE, path, None).await?.json()
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let body = serde_json::to_value(body)?;
        self.send(Method::POST, path, Some(&body)).await?.json()
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let body = serde_json::to_value(body)?;
        self.send(Method::PUT, path, Some(&body)).await?.json()
    }

    pub async fn patch<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let body = serde_json::to_value(body)?;
        self.send(Method::PATCH, path, Some(&body)).await?.json()
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .finish()
    }
}
