// src/user/store.rs
// Settings sync: local mirror of the user's profile and settings, pushed to the API
//
// Every mutator sends first and applies locally only after the server accepts
// the change. Failures are logged and returned; the mirror stays as it was.

use crate::api::endpoints::{USERS_FAVORITES, USERS_SECURITY, USERS_SETTINGS, USERS_UPDATE};
use crate::api::{ApiClient, ApiResponse};
use crate::error::{LexiError, Result};
use crate::genai::VoiceName;
use crate::user::model::{Favorites, User, UserSettings};
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct UserState {
    user: Option<User>,
    settings: UserSettings,
}

/// Local mirror of the signed-in user's profile and settings
pub struct UserStore {
    api: ApiClient,
    state: RwLock<UserState>,
}

impl UserStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: RwLock::new(UserState::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, UserState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, UserState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Local mirror ───────────────────────────────────────────────────

    /// Hydrate the mirror from a full profile (login, token validation)
    pub fn save_user(&self, user: User) {
        let mut state = self.write();
        if let Some(settings) = &user.settings {
            let mut settings = settings.clone();
            if settings.favorites.is_none() {
                settings.favorites = state.settings.favorites.take();
            }
            state.settings = settings;
        }
        debug!(user_id = %user.id, "User profile stored");
        state.user = Some(user);
    }

    pub fn user(&self) -> Option<User> {
        self.read().user.clone()
    }

    pub fn settings(&self) -> UserSettings {
        self.read().settings.clone()
    }

    pub fn favorites(&self) -> Favorites {
        self.read().settings.favorites.clone().unwrap_or_default()
    }

    pub fn is_favorite(&self, topic_id: &str) -> bool {
        self.read()
            .settings
            .favorites
            .as_ref()
            .and_then(|f| f.get(topic_id))
            .copied()
            .unwrap_or(false)
    }

    pub fn clear(&self) {
        *self.write() = UserState::default();
    }

    // ── Remote sync ────────────────────────────────────────────────────

    /// Pull settings from the server. `None` when the user has none yet.
    pub async fn fetch_user_settings(&self) -> Result<Option<UserSettings>> {
        let response = self
            .api
            .send(Method::GET, USERS_SETTINGS, None)
            .await
            .inspect_err(|e| warn!(error = %e, "Error fetching settings"))?;

        let Some(raw) = response.field("settings") else {
            info!("Settings are not set up");
            return Ok(None);
        };

        let mut settings: UserSettings = serde_json::from_value(raw.clone())?;
        let mut state = self.write();
        // Keep the favorites we have when the server omits them
        if settings.favorites.is_none() {
            settings.favorites = state.settings.favorites.clone();
        }
        state.settings = settings.clone();
        info!(language_id = %settings.language_id, "Settings retrieved");
        Ok(Some(settings))
    }

    pub async fn save_language(&self, language_id: &str, style_id: &str) -> Result<()> {
        let body = json!({
            "settings": {
                "language_id": language_id,
                "style_id": style_id,
            }
        });
        self.api
            .send(Method::PATCH, USERS_SETTINGS, Some(&body))
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to update language"))?;

        let mut state = self.write();
        state.settings.language_id = language_id.to_string();
        state.settings.style_id = style_id.to_string();
        info!(language_id, style_id, "Language updated");
        Ok(())
    }

    pub async fn toggle_favorite(&self, topic_id: &str, is_favorite: bool) -> Result<()> {
        if topic_id.trim().is_empty() {
            return Err(LexiError::invalid_input("topic id must not be empty"));
        }

        let body = json!({ "favorites": { topic_id: is_favorite } });
        self.api
            .send(Method::PATCH, USERS_FAVORITES, Some(&body))
            .await
            .inspect_err(|e| warn!(topic_id, error = %e, "Error updating favorites"))?;

        let mut state = self.write();
        let favorites = state.settings.favorites.get_or_insert_with(Favorites::new);
        if is_favorite {
            favorites.insert(topic_id.to_string(), true);
        } else {
            favorites.remove(topic_id);
        }
        info!(topic_id, is_favorite, "Favorite updated");
        Ok(())
    }

    /// Voice and Gemini key for the tutor. Applies what the server echoes back.
    pub async fn save_lexi_settings(&self, voice_name: VoiceName, api_key: &str) -> Result<()> {
        let body = json!({
            "settings": {
                "voice_name": voice_name,
                "api_key": api_key,
            }
        });
        let response = self
            .api
            .send(Method::PATCH, USERS_SETTINGS, Some(&body))
            .await
            .inspect_err(|e| warn!(error = %e, "Error updating Lexi settings"))?;

        let Some(echoed) = confirmed_object(&response, "settings") else {
            warn!(status = response.status.as_u16(), "Unexpected response when updating Lexi settings");
            return Err(LexiError::unexpected("settings update was not confirmed"));
        };
        let echoed: UserSettings = serde_json::from_value(echoed.clone())?;

        let mut state = self.write();
        state.settings.voice_name = echoed.voice_name;
        state.settings.api_key = echoed.api_key;
        info!(voice_name = ?state.settings.voice_name, "Lexi settings updated");
        Ok(())
    }

    pub async fn save_profile_settings(&self, username: &str, email: &str) -> Result<()> {
        if username.trim().is_empty() || email.trim().is_empty() {
            return Err(LexiError::invalid_input("username and email must not be empty"));
        }

        let body = json!({ "username": username, "email": email });
        let response = self
            .api
            .send(Method::PATCH, USERS_UPDATE, Some(&body))
            .await
            .inspect_err(|e| warn!(error = %e, "Error updating profile"))?;

        let field = |name: &str| response.field(name).and_then(Value::as_str).map(str::to_string);
        let (Some(new_username), Some(new_email)) = (field("username"), field("email")) else {
            warn!("Profile update response is missing username or email");
            return Err(LexiError::unexpected("profile update did not echo username and email"));
        };

        let mut state = self.write();
        let user = state.user.get_or_insert_with(User::default);
        user.username = new_username;
        user.email = new_email;
        info!(username = %user.username, "User profile updated");
        Ok(())
    }

    pub async fn save_security_settings(&self, password: &str) -> Result<()> {
        if password.is_empty() {
            return Err(LexiError::invalid_input("password must not be empty"));
        }

        let body = json!({ "password": password });
        let response = self
            .api
            .send(Method::PATCH, USERS_SECURITY, Some(&body))
            .await
            .inspect_err(|e| warn!(error = %e, "Error saving a new password"))?;

        if confirmed_object(&response, "user").is_none() {
            warn!(status = response.status.as_u16(), "Unexpected response when saving a new password");
            return Err(LexiError::unexpected("password change was not confirmed"));
        }
        info!("New password saved");
        Ok(())
    }
}

/// The named object in a 200 response, if the server confirmed with one
fn confirmed_object<'a>(response: &'a ApiResponse, name: &str) -> Option<&'a Value> {
    (response.status == StatusCode::OK)
        .then(|| response.field(name))
        .flatten()
        .filter(|v| v.is_object())
}

impl std::fmt::Debug for UserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserStore").field("state", &*self.read()).finish()
    }
}
