// src/session/manager.rs
// Session manager: validation caching, login, registration, logout

use crate::api::ApiClient;
use crate::api::endpoints::{JWT_VALIDATE, USERS_LOGIN, USERS_REGISTER};
use crate::error::{LexiError, Result};
use crate::navigation::Route;
use crate::session::Session;
use crate::user::{User, UserStore};
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Body of a successful `POST /api/users/login`
#[derive(Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<User>,
}

/// Answers "is the user signed in" and owns the login/logout transitions
pub struct SessionManager {
    api: ApiClient,
    users: Arc<UserStore>,
    login_redirect_delay: Duration,
}

impl SessionManager {
    pub fn new(api: ApiClient, users: Arc<UserStore>, login_redirect_delay: Duration) -> Self {
        Self {
            api,
            users,
            login_redirect_delay,
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        self.api.session()
    }

    pub fn users(&self) -> &Arc<UserStore> {
        &self.users
    }

    pub fn token(&self) -> Option<String> {
        self.session().token()
    }

    /// Cached flag when already true, otherwise validate and cache the answer.
    ///
    /// Concurrent callers are not deduplicated; each may validate.
    pub async fn is_authenticated(&self) -> Result<bool> {
        if self.session().is_flagged_authenticated() {
            return Ok(true);
        }
        let valid = self.is_valid_token().await?;
        self.session().set_authenticated(valid);
        Ok(valid)
    }

    /// Ask the server whether the held token is still good.
    ///
    /// A 401 deletes the token but does not redirect; other failures propagate.
    pub async fn is_valid_token(&self) -> Result<bool> {
        if !self.session().has_token() {
            error!("Token is missing");
            return Ok(false);
        }

        let response = self
            .api
            .execute(Method::GET, JWT_VALIDATE, None, HeaderMap::new())
            .await?;

        let status = response.status;
        if status.is_success() {
            debug!(
                has_decoded_token = response.field("decoded_token").is_some(),
                "Token is valid"
            );
            if let Some(user) = response.field("user") {
                let user: User = serde_json::from_value(user.clone())?;
                self.users.save_user(user);
            }
            return Ok(true);
        }

        if status == StatusCode::UNAUTHORIZED {
            error!("Token is invalid");
            self.session().delete_token();
            return Ok(false);
        }

        let message = response.error_message();
        warn!(status = status.as_u16(), message = %message, "Error validating token");
        Err(LexiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    /// Exchange credentials for a token. On success the token and profile are
    /// stored, the flag is set and a redirect to the tutor view is scheduled.
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        match self.request_token(email, password).await {
            Ok(login) => {
                self.session().save_token(&login.token);
                if let Some(user) = login.user {
                    self.users.save_user(user);
                }
                self.session().set_authenticated(true);
                info!(email, "Login successful");
                self.schedule_redirect(Route::Lexi);
                Ok(())
            }
            Err(e) => {
                self.session().set_authenticated(false);
                warn!(email, error = %e, "Login failed");
                Err(e)
            }
        }
    }

    async fn request_token(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let body = json!({ "email": email, "password": password });
        let response = self
            .api
            .execute(Method::POST, USERS_LOGIN, Some(&body), HeaderMap::new())
            .await
            .map_err(|e| LexiError::Login(e.to_string()))?;

        if !response.status.is_success() {
            return Err(LexiError::Login(response.error_message()));
        }

        let login: LoginResponse = response
            .json()
            .map_err(|e| LexiError::Login(format!("malformed login response: {}", e)))?;
        if login.token.trim().is_empty() {
            return Err(LexiError::Login("server returned an empty token".to_string()));
        }
        Ok(login)
    }

    fn schedule_redirect(&self, route: Route) {
        let navigator = self.session().navigator();
        let delay = self.login_redirect_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            navigator.navigate(route);
        });
    }

    /// Create an account. Does not sign in.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<Option<User>> {
        if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(LexiError::invalid_input(
                "username, email and password are required",
            ));
        }

        let body = json!({ "username": username, "email": email, "password": password });
        let response = self
            .api
            .send(Method::POST, USERS_REGISTER, Some(&body))
            .await
            .inspect_err(|e| warn!(email, error = %e, "Registration failed"))?;

        info!(email, "Registration successful");
        match response.field("user") {
            Some(user) => Ok(Some(serde_json::from_value(user.clone())?)),
            None => Ok(None),
        }
    }

    /// Local only: drop token and flag, then go to the login view
    pub fn logout(&self) {
        self.session().logout();
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("session", self.session())
            .field("login_redirect_delay", &self.login_redirect_delay)
            .finish()
    }
}
