// src/user/model.rs
// User profile and settings as the Lexi API sends them

use crate::genai::VoiceName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Topic id → favorited
pub type Favorites = BTreeMap<String, bool>;

/// User profile, a local mirror of the server record
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<UserSettings>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("created_at", &self.created_at)
            .field("settings", &self.settings)
            .finish()
    }
}

/// Per-user learning and assistant settings. Every field is optional on the wire.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub language_id: String,
    pub level: String,
    pub topic_id: String,
    pub style_id: String,
    /// `None` when the payload carried no favorites; the mirror keeps its own then
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorites: Option<Favorites>,
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_name: Option<VoiceName>,
}

impl UserSettings {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl fmt::Debug for UserSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserSettings")
            .field("language_id", &self.language_id)
            .field("level", &self.level)
            .field("topic_id", &self.topic_id)
            .field("style_id", &self.style_id)
            .field("favorites", &self.favorites)
            .field("api_key", &if self.has_api_key() { "<redacted>" } else { "" })
            .field("voice_name", &self.voice_name)
            .finish()
    }
}

/// Unparseable or missing timestamps become `None` instead of failing the whole profile
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }))
}
