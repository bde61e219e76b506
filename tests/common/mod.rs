// tests/common/mod.rs
// Stateful in-process mock of the Lexi API

#![allow(dead_code)]

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use lexi::{ChannelNavigator, ClientConfig, LexiClient, Route};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

pub const EMAIL: &str = "ana@example.com";
pub const PASSWORD: &str = "correct horse";
pub const USERNAME: &str = "ana";

#[derive(Debug)]
pub struct MockState {
    pub username: String,
    pub email: String,
    pub password: String,
    pub settings: Value,
    pub valid_token: Option<String>,
    pub tokens_issued: usize,
    pub validate_hits: usize,
    /// Canned status and body for the next settings/profile mutation
    pub respond_next: Option<(u16, Value)>,
    /// Status every validation returns instead of checking the token
    pub validate_status: Option<u16>,
    pub registered: Vec<String>,
}

type Shared = Arc<Mutex<MockState>>;
type Reply = (StatusCode, Json<Value>);

pub struct MockLexi {
    pub base_url: String,
    pub state: Shared,
}

impl MockLexi {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(MockState {
            username: USERNAME.to_string(),
            email: EMAIL.to_string(),
            password: PASSWORD.to_string(),
            settings: json!({
                "language_id": "es",
                "level": "A2",
                "topic_id": "travel",
                "style_id": "casual",
                "favorites": {"travel": true},
                "api_key": "",
                "voice_name": "Puck"
            }),
            valid_token: None,
            tokens_issued: 0,
            validate_hits: 0,
            respond_next: None,
            validate_status: None,
            registered: vec![EMAIL.to_string()],
        }));

        let app = Router::new()
            .route("/api/jwt/validate", get(validate))
            .route("/api/users/login", post(login))
            .route("/api/users/register", post(register))
            .route("/api/users/settings", get(get_settings).patch(patch_settings))
            .route("/api/users/favorites", patch(patch_favorites))
            .route("/api/users/update", patch(patch_profile))
            .route("/api/users/security", patch(patch_security))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Client with an in-memory session and a short login redirect
    pub fn client(&self) -> (LexiClient, UnboundedReceiver<Route>) {
        let config = ClientConfig::new(&self.base_url)
            .with_login_redirect_delay(Duration::from_millis(10));
        let (navigator, routes) = ChannelNavigator::channel();
        let client = LexiClient::new(config, Arc::new(navigator)).unwrap();
        (client, routes)
    }

    /// Server-side invalidation, e.g. token expiry
    pub fn revoke_token(&self) {
        self.state.lock().unwrap().valid_token = None;
    }

    pub fn validate_hits(&self) -> usize {
        self.state.lock().unwrap().validate_hits
    }

    pub fn fail_next(&self, status: u16) {
        self.respond_next(status, json!({"message": "Something went wrong"}));
    }

    /// Answer the next mutation with exactly this, skipping the update
    pub fn respond_next(&self, status: u16, body: Value) {
        self.state.lock().unwrap().respond_next = Some((status, body));
    }

    pub fn fail_validation(&self, status: u16) {
        self.state.lock().unwrap().validate_status = Some(status);
    }

    pub fn settings(&self) -> Value {
        self.state.lock().unwrap().settings.clone()
    }

    pub fn clear_settings(&self) {
        self.state.lock().unwrap().settings = Value::Null;
    }
}

/// Base URL of a local port nothing listens on
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

/// Wait for the next navigation, failing the test after a second
pub async fn next_route(routes: &mut UnboundedReceiver<Route>) -> Route {
    tokio::time::timeout(Duration::from_secs(1), routes.recv())
        .await
        .expect("no navigation within a second")
        .expect("navigator dropped")
}

/// Sign in and consume the post-login redirect
pub async fn signed_in(mock: &MockLexi) -> (LexiClient, UnboundedReceiver<Route>) {
    let (client, mut routes) = mock.client();
    client.auth().login(EMAIL, PASSWORD).await.unwrap();
    assert_eq!(next_route(&mut routes).await, Route::Lexi);
    (client, routes)
}

fn user_json(state: &MockState) -> Value {
    json!({
        "_id": "65a1f0",
        "username": state.username,
        "email": state.email,
        "created_at": "2024-11-02T09:30:00.000Z",
        "settings": state.settings,
    })
}

fn reply(status: StatusCode, body: Value) -> Reply {
    (status, Json(body))
}

fn unauthorized() -> Reply {
    reply(StatusCode::UNAUTHORIZED, json!({"message": "Invalid token"}))
}

fn authorized(state: &MockState, headers: &HeaderMap) -> bool {
    let Some(token) = &state.valid_token else {
        return false;
    };
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", token))
}

/// Auth check plus the injected failure, if any
fn guard(state: &mut MockState, headers: &HeaderMap) -> Option<Reply> {
    if !authorized(state, headers) {
        return Some(unauthorized());
    }
    state
        .respond_next
        .take()
        .map(|(code, body)| reply(StatusCode::from_u16(code).unwrap(), body))
}

async fn validate(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let mut state = state.lock().unwrap();
    state.validate_hits += 1;
    if let Some(code) = state.validate_status {
        return reply(
            StatusCode::from_u16(code).unwrap(),
            json!({"message": "Validation unavailable"}),
        );
    }
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    reply(
        StatusCode::OK,
        json!({
            "decoded_token": {"id": "65a1f0", "iat": 1730539800},
            "user": user_json(&state),
        }),
    )
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    let mut state = state.lock().unwrap();
    if body["email"] != state.email.as_str() || body["password"] != state.password.as_str() {
        return reply(
            StatusCode::UNAUTHORIZED,
            json!({"message": "Invalid email or password"}),
        );
    }
    state.tokens_issued += 1;
    let token = format!("token-{}", state.tokens_issued);
    state.valid_token = Some(token.clone());
    reply(StatusCode::OK, json!({"token": token, "user": user_json(&state)}))
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    let mut state = state.lock().unwrap();
    let email = body["email"].as_str().unwrap_or_default().to_string();
    if state.registered.contains(&email) {
        return reply(
            StatusCode::CONFLICT,
            json!({"message": "Email already registered"}),
        );
    }
    state.registered.push(email.clone());
    reply(
        StatusCode::CREATED,
        json!({"user": {"_id": "77b2", "username": body["username"], "email": email}}),
    )
}

async fn get_settings(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let state = state.lock().unwrap();
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    if state.settings.is_null() {
        return reply(StatusCode::OK, json!({}));
    }
    reply(StatusCode::OK, json!({"settings": state.settings}))
}

async fn patch_settings(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut state = state.lock().unwrap();
    if let Some(failure) = guard(&mut state, &headers) {
        return failure;
    }
    if state.settings.is_null() {
        state.settings = json!({});
    }
    if let (Some(current), Some(update)) = (
        state.settings.as_object_mut(),
        body["settings"].as_object(),
    ) {
        for (key, value) in update {
            current.insert(key.clone(), value.clone());
        }
    }
    reply(StatusCode::OK, json!({"settings": state.settings}))
}

async fn patch_favorites(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut state = state.lock().unwrap();
    if let Some(failure) = guard(&mut state, &headers) {
        return failure;
    }
    if state.settings.get("favorites").is_none_or(|f| !f.is_object()) {
        state.settings["favorites"] = json!({});
    }
    if let Some(update) = body["favorites"].as_object() {
        for (topic, value) in update {
            if value.as_bool() == Some(true) {
                state.settings["favorites"][topic.as_str()] = json!(true);
            } else if let Some(favorites) = state.settings["favorites"].as_object_mut() {
                favorites.remove(topic);
            }
        }
    }
    reply(StatusCode::OK, json!({"favorites": state.settings["favorites"]}))
}

async fn patch_profile(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut state = state.lock().unwrap();
    if let Some(failure) = guard(&mut state, &headers) {
        return failure;
    }
    if let Some(username) = body["username"].as_str() {
        state.username = username.to_string();
    }
    if let Some(email) = body["email"].as_str() {
        state.email = email.to_string();
    }
    reply(
        StatusCode::OK,
        json!({"username": state.username, "email": state.email}),
    )
}

async fn patch_security(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut state = state.lock().unwrap();
    if let Some(failure) = guard(&mut state, &headers) {
        return failure;
    }
    let Some(password) = body["password"].as_str() else {
        return reply(StatusCode::BAD_REQUEST, json!({"message": "password is required"}));
    };
    state.password = password.to_string();
    reply(StatusCode::OK, json!({"user": user_json(&state)}))
}
