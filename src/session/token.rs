// src/session/token.rs
// Bearer token storage: process memory, optionally mirrored to a JSON file

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, warn};

/// On-disk shape of the persisted session
#[derive(Debug, Serialize, Deserialize)]
struct PersistedToken {
    jwt_token: String,
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
}

/// Holds the bearer token. An empty string means "no token".
///
/// The in-memory copy is authoritative; file writes are best effort and only
/// logged on failure.
#[derive(Debug, Default)]
pub struct TokenStore {
    token: RwLock<String>,
    file: Option<PathBuf>,
}

impl TokenStore {
    /// Token lives for the lifetime of the process
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Token survives restarts in `path`; an existing token is loaded now
    pub fn persistent(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let token = load_token(&path).unwrap_or_default();
        if !token.is_empty() {
            debug!(path = %path.display(), "Restored session token");
        }
        Self {
            token: RwLock::new(token),
            file: Some(path),
        }
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Current token, `None` when absent
    pub fn get(&self) -> Option<String> {
        let token = self.token.read().unwrap_or_else(PoisonError::into_inner);
        (!token.is_empty()).then(|| token.clone())
    }

    pub fn is_present(&self) -> bool {
        !self.token.read().unwrap_or_else(PoisonError::into_inner).is_empty()
    }

    pub fn save(&self, token: &str) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token.to_string();

        if let Some(path) = &self.file
            && let Err(e) = write_token(path, token)
        {
            warn!(path = %path.display(), error = %e, "Failed to persist session token");
        }
    }

    pub fn delete(&self) {
        self.token.write().unwrap_or_else(PoisonError::into_inner).clear();

        if let Some(path) = &self.file {
            match fs::remove_file(path) {
                Ok(()) => debug!(path = %path.display(), "Removed persisted session token"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to remove persisted session token")
                }
            }
        }
    }
}

fn load_token(path: &Path) -> Option<String> {
    let contents = fs::read_to_string(path).ok()?;
    match serde_json::from_str::<PersistedToken>(&contents) {
        Ok(persisted) => Some(persisted.jwt_token),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable session file");
            None
        }
    }
}

fn write_token(path: &Path, token: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let persisted = PersistedToken {
        jwt_token: token.to_string(),
        saved_at: Some(Utc::now()),
    };
    let json = serde_json::to_string_pretty(&persisted)?;

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    // Owner-only from creation
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;

    // mode() only applies to new files; tighten one left by an older version
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(json.as_bytes())?;
    Ok(())
}
