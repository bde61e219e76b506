// src/client.rs
// LexiClient: wires session, request wrapper, settings store and tutor from one config

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::genai::{Conversation, GeminiClient, tutor_config};
use crate::http::create_client;
use crate::navigation::Navigator;
use crate::session::{Session, SessionManager, TokenStore};
use crate::user::UserStore;
use std::sync::Arc;
use tracing::{debug, info};

/// Everything a Lexi front end needs, sharing one HTTP client and one session
#[derive(Debug)]
pub struct LexiClient {
    config: ClientConfig,
    http: reqwest::Client,
    api: ApiClient,
    users: Arc<UserStore>,
    auth: SessionManager,
}

impl LexiClient {
    pub fn new(config: ClientConfig, navigator: Arc<dyn Navigator>) -> Result<Self> {
        let base_url = config.api_base_url()?;
        let http = create_client(config.request_timeout, config.connect_timeout);

        let tokens = match &config.session_file {
            Some(path) => TokenStore::persistent(path.clone()),
            None => TokenStore::in_memory(),
        };
        let session = Arc::new(Session::new(tokens, navigator));
        let api = ApiClient::new(http.clone(), base_url, session);
        let users = Arc::new(UserStore::new(api.clone()));
        let auth = SessionManager::new(api.clone(), Arc::clone(&users), config.login_redirect_delay);

        info!(
            api = %api.base_url(),
            persistent_session = config.session_file.is_some(),
            "Lexi client ready"
        );
        Ok(Self {
            config,
            http,
            api,
            users,
            auth,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn auth(&self) -> &SessionManager {
        &self.auth
    }

    pub fn users(&self) -> &Arc<UserStore> {
        &self.users
    }

    pub fn session(&self) -> &Arc<Session> {
        self.api.session()
    }

    /// Gemini client for the current user's settings
    pub fn gemini(&self) -> Result<GeminiClient> {
        GeminiClient::for_user(&self.users.settings(), &self.config, self.http.clone())
    }

    /// Fresh tutor conversation shaped by the current user's settings
    pub fn tutor(&self) -> Result<Conversation<GeminiClient>> {
        let gemini = self.gemini()?;
        let settings = self.users.settings();
        debug!(language_id = %settings.language_id, "Starting tutor conversation");
        let live = tutor_config(&settings, &self.config.gemini_model);
        Ok(Conversation::from_live_config(gemini, live))
    }
}
