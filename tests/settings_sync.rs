// tests/settings_sync.rs
// Settings store mutations: confirm-then-apply against the mock Lexi API

mod common;

use common::{EMAIL, MockLexi, PASSWORD, signed_in};
use lexi::LexiError;
use lexi::genai::VoiceName;
use serde_json::json;

#[tokio::test]
async fn test_fetch_settings_updates_mirror() {
    let mock = MockLexi::start().await;
    let (client, _routes) = signed_in(&mock).await;
    client.users().clear();

    let settings = client.users().fetch_user_settings().await.unwrap().unwrap();

    assert_eq!(settings.level, "A2");
    assert_eq!(settings.voice_name, Some(VoiceName::Puck));
    assert!(client.users().is_favorite("travel"));
}

#[tokio::test]
async fn test_fetch_without_settings() {
    let mock = MockLexi::start().await;
    let (client, _routes) = signed_in(&mock).await;
    mock.clear_settings();

    assert!(client.users().fetch_user_settings().await.unwrap().is_none());
    // Mirror keeps what login delivered
    assert_eq!(client.users().settings().language_id, "es");
}

#[tokio::test]
async fn test_toggle_favorite_applies_after_confirmation() {
    let mock = MockLexi::start().await;
    let (client, _routes) = signed_in(&mock).await;

    client.users().toggle_favorite("food", true).await.unwrap();
    assert!(client.users().is_favorite("food"));
    assert_eq!(mock.settings()["favorites"]["food"], true);

    client.users().toggle_favorite("travel", false).await.unwrap();
    assert!(!client.users().is_favorite("travel"));
    assert!(mock.settings()["favorites"].get("travel").is_none());
}

#[tokio::test]
async fn test_failed_favorite_leaves_mirror() {
    let mock = MockLexi::start().await;
    let (client, _routes) = signed_in(&mock).await;
    mock.fail_next(500);

    let err = client
        .users()
        .toggle_favorite("food", true)
        .await
        .unwrap_err();

    assert!(matches!(err, LexiError::Status { status: 500, .. }));
    assert!(!client.users().is_favorite("food"));
    assert!(client.users().is_favorite("travel"));
    // Only 401 ends the session
    assert!(client.auth().token().is_some());
}

#[tokio::test]
async fn test_save_language() {
    let mock = MockLexi::start().await;
    let (client, _routes) = signed_in(&mock).await;

    client.users().save_language("fr", "formal").await.unwrap();

    let settings = client.users().settings();
    assert_eq!(settings.language_id, "fr");
    assert_eq!(settings.style_id, "formal");
    assert_eq!(mock.settings()["language_id"], "fr");
}

#[tokio::test]
async fn test_save_language_leaves_checks_to_server() {
    let mock = MockLexi::start().await;
    let (client, _routes) = signed_in(&mock).await;

    client.users().save_language("", "").await.unwrap();

    assert_eq!(client.users().settings().language_id, "");
    assert_eq!(mock.settings()["language_id"], "");
}

#[tokio::test]
async fn test_failed_language_change_leaves_mirror() {
    let mock = MockLexi::start().await;
    let (client, _routes) = signed_in(&mock).await;
    mock.fail_next(503);

    assert!(client.users().save_language("de", "").await.is_err());
    assert_eq!(client.users().settings().language_id, "es");
    assert_eq!(client.users().settings().style_id, "casual");
}

#[tokio::test]
async fn test_save_lexi_settings_applies_echo() {
    let mock = MockLexi::start().await;
    let (client, _routes) = signed_in(&mock).await;

    client
        .users()
        .save_lexi_settings(VoiceName::Aoede, "AIza-user-key")
        .await
        .unwrap();

    let settings = client.users().settings();
    assert_eq!(settings.voice_name, Some(VoiceName::Aoede));
    assert_eq!(settings.api_key, "AIza-user-key");
    assert_eq!(mock.settings()["voice_name"], "Aoede");
    // The stored key now feeds the tutor
    assert!(client.tutor().is_ok());
}

#[tokio::test]
async fn test_save_profile_settings() {
    let mock = MockLexi::start().await;
    let (client, _routes) = signed_in(&mock).await;

    client
        .users()
        .save_profile_settings("ana_b", "ana.b@example.com")
        .await
        .unwrap();

    let user = client.users().user().unwrap();
    assert_eq!(user.username, "ana_b");
    assert_eq!(user.email, "ana.b@example.com");
}

#[tokio::test]
async fn test_failed_profile_update_leaves_mirror() {
    let mock = MockLexi::start().await;
    let (client, _routes) = signed_in(&mock).await;
    mock.fail_next(400);

    assert!(
        client
            .users()
            .save_profile_settings("x", "x@example.com")
            .await
            .is_err()
    );
    assert_eq!(client.users().user().unwrap().email, EMAIL);
}

#[tokio::test]
async fn test_password_change_then_login() {
    let mock = MockLexi::start().await;
    let (client, _routes) = signed_in(&mock).await;

    client
        .users()
        .save_security_settings("new secret")
        .await
        .unwrap();

    let (fresh, _fresh_routes) = mock.client();
    assert!(fresh.auth().login(EMAIL, "new secret").await.is_ok());
}

#[tokio::test]
async fn test_lexi_settings_need_200() {
    let mock = MockLexi::start().await;
    let (client, _routes) = signed_in(&mock).await;
    mock.respond_next(201, json!({"settings": {"voice_name": "Kore", "api_key": "k2"}}));

    let err = client
        .users()
        .save_lexi_settings(VoiceName::Kore, "k2")
        .await
        .unwrap_err();

    assert!(matches!(err, LexiError::UnexpectedResponse(_)));
    let settings = client.users().settings();
    assert_eq!(settings.voice_name, Some(VoiceName::Puck));
    assert_eq!(settings.api_key, "");
}

#[tokio::test]
async fn test_lexi_settings_need_settings_echo() {
    let mock = MockLexi::start().await;
    let (client, _routes) = signed_in(&mock).await;
    mock.respond_next(200, json!({"message": "saved"}));

    let err = client
        .users()
        .save_lexi_settings(VoiceName::Charon, "k3")
        .await
        .unwrap_err();

    assert!(matches!(err, LexiError::UnexpectedResponse(_)));
    let settings = client.users().settings();
    assert_eq!(settings.voice_name, Some(VoiceName::Puck));
    assert!(!settings.has_api_key());
}

#[tokio::test]
async fn test_failed_lexi_settings_leave_mirror() {
    let mock = MockLexi::start().await;
    let (client, _routes) = signed_in(&mock).await;
    mock.fail_next(500);

    let err = client
        .users()
        .save_lexi_settings(VoiceName::Fenrir, "k4")
        .await
        .unwrap_err();

    assert!(matches!(err, LexiError::Status { status: 500, .. }));
    let settings = client.users().settings();
    assert_eq!(settings.voice_name, Some(VoiceName::Puck));
    assert_eq!(settings.api_key, "");
    assert_eq!(mock.settings()["voice_name"], "Puck");
}

#[tokio::test]
async fn test_password_change_needs_user_echo() {
    let mock = MockLexi::start().await;
    let (client, _routes) = signed_in(&mock).await;

    mock.respond_next(200, json!({"message": "updated"}));
    let err = client
        .users()
        .save_security_settings("new secret")
        .await
        .unwrap_err();
    assert!(matches!(err, LexiError::UnexpectedResponse(_)));

    mock.respond_next(201, json!({"user": {"_id": "65a1f0"}}));
    let err = client
        .users()
        .save_security_settings("new secret")
        .await
        .unwrap_err();
    assert!(matches!(err, LexiError::UnexpectedResponse(_)));

    // Neither canned reply touched the server-side password
    let (fresh, _fresh_routes) = mock.client();
    assert!(fresh.auth().login(EMAIL, PASSWORD).await.is_ok());
}
