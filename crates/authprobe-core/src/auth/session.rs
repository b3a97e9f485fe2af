use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::LoginResponse;

/// Session file name in the cache directory
const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl SessionData {
    pub fn from_login(email: &str, login: &LoginResponse) -> Self {
        Self {
            access_token: login.tokens.access_token.clone(),
            refresh_token: login.tokens.refresh_token().map(str::to_string),
            email: email.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Holds the access token between login and authenticated calls.
///
/// In-memory by default; `with_dir` backs it with `session.json` so the
/// token survives across runs.
#[derive(Debug, Default)]
pub struct Session {
    cache_dir: Option<PathBuf>,
    pub data: Option<SessionData>,
}

impl Session {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir: Some(cache_dir),
            data: None,
        }
    }

    /// Load session from disk. Returns whether a token was found.
    pub fn load(&mut self) -> Result<bool> {
        let Some(path) = self.session_path() else {
            return Ok(false);
        };
        if !path.exists() {
            return Ok(false);
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read session file {}", path.display()))?;
        let data: SessionData = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse session file {}", path.display()))?;
        self.data = Some(data);
        Ok(true)
    }

    /// Save session to disk; a no-op for in-memory sessions
    pub fn save(&self) -> Result<()> {
        if let (Some(path), Some(data)) = (self.session_path(), self.data.as_ref()) {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let contents = serde_json::to_string_pretty(data)?;
            std::fs::write(&path, contents)
                .with_context(|| format!("Failed to write session file {}", path.display()))?;
            debug!(path = %path.display(), "Session saved");
        }
        Ok(())
    }

    /// Clear session data and remove the file, if any
    pub fn clear(&mut self) -> Result<()> {
        self.data = None;
        if let Some(path) = self.session_path() {
            if path.exists() {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove session file {}", path.display()))?;
            }
        }
        Ok(())
    }

    /// Replace the session with new data. Overwrites any earlier token.
    pub fn update(&mut self, data: SessionData) {
        self.data = Some(data);
    }

    /// Get the bearer token, if a login has been recorded
    pub fn token(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.access_token.as_str())
    }

    fn session_path(&self) -> Option<PathBuf> {
        self.cache_dir.as_ref().map(|dir| dir.join(SESSION_FILE))
    }
}
