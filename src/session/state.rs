// src/session/state.rs
// Shared session state: token, cached authentication flag, navigation sink

use crate::navigation::{Navigator, Route};
use crate::session::token::TokenStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// State shared by the request wrapper and the session manager.
///
/// Both need to end the session: the manager on explicit logout, the
/// wrapper when the server rejects the token.
pub struct Session {
    tokens: TokenStore,
    authenticated: AtomicBool,
    navigator: Arc<dyn Navigator>,
}

impl Session {
    pub fn new(tokens: TokenStore, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            tokens,
            authenticated: AtomicBool::new(false),
            navigator,
        }
    }

    pub fn token(&self) -> Option<String> {
        self.tokens.get()
    }

    pub fn has_token(&self) -> bool {
        self.tokens.is_present()
    }

    pub fn save_token(&self, token: &str) {
        self.tokens.save(token);
    }

    pub fn delete_token(&self) {
        self.tokens.delete();
    }

    pub fn token_store(&self) -> &TokenStore {
        &self.tokens
    }

    /// Cached flag only; never touches the network
    pub fn is_flagged_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    pub fn set_authenticated(&self, value: bool) {
        self.authenticated.store(value, Ordering::SeqCst);
    }

    pub fn navigator(&self) -> Arc<dyn Navigator> {
        Arc::clone(&self.navigator)
    }

    pub fn navigate(&self, route: Route) {
        self.navigator.navigate(route);
    }

    /// Clear token and flag, then send the user to the login view.
    /// Always navigates, whatever the prior state was.
    pub fn logout(&self) {
        self.tokens.delete();
        self.set_authenticated(false);
        info!("User is logged out");
        self.navigator.navigate(Route::Login);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("has_token", &self.has_token())
            .field("authenticated", &self.is_flagged_authenticated())
            .finish()
    }
}
