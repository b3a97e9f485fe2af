//! Application configuration management.
//!
//! Settings come from three layers, later ones winning: built-in defaults,
//! `~/.config/authprobe/config.json`, and `AUTHPROBE_*` environment variables
//! (the binary loads `.env` before reading them).

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::credentials::{DEFAULT_EMAIL, DEFAULT_PASSWORD};
use crate::auth::Credentials;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "authprobe";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000/api";

/// Pause between a successful login and the profile request.
const DEFAULT_PROFILE_DELAY_MS: u64 = 1000;

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Origin the frontend is served from; used for the CORS preflight probe
const DEFAULT_ORIGIN: &str = "http://127.0.0.1:5500";

const ENV_BASE_URL: &str = "AUTHPROBE_BASE_URL";
const ENV_EMAIL: &str = "AUTHPROBE_EMAIL";
const ENV_PASSWORD: &str = "AUTHPROBE_PASSWORD";
const ENV_DELAY_MS: &str = "AUTHPROBE_DELAY_MS";
const ENV_TIMEOUT_SECS: &str = "AUTHPROBE_TIMEOUT_SECS";
const ENV_ORIGIN: &str = "AUTHPROBE_ORIGIN";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub email: String,
    pub password: String,
    pub profile_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub origin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            email: DEFAULT_EMAIL.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            profile_delay_ms: DEFAULT_PROFILE_DELAY_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            origin: DEFAULT_ORIGIN.to_string(),
        }
    }
}

impl Config {
    /// Load config file (if any) and apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Ok(path) => Self::load_from(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Override fields from environment-style lookups
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_BASE_URL) {
            self.base_url = v;
        }
        if let Some(v) = lookup(ENV_EMAIL) {
            self.email = v;
        }
        if let Some(v) = lookup(ENV_PASSWORD) {
            self.password = v;
        }
        if let Some(v) = lookup(ENV_DELAY_MS) {
            self.profile_delay_ms = v
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number of milliseconds, got {:?}", ENV_DELAY_MS, v))?;
        }
        if let Some(v) = lookup(ENV_TIMEOUT_SECS) {
            self.request_timeout_secs = v
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number of seconds, got {:?}", ENV_TIMEOUT_SECS, v))?;
        }
        if let Some(v) = lookup(ENV_ORIGIN) {
            self.origin = v;
        }
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.email.clone(), self.password.clone())
    }

    pub fn profile_delay(&self) -> Duration {
        Duration::from_millis(self.profile_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the persisted session
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.base_url, "http://127.0.0.1:5000/api");
        assert_eq!(config.credentials(), Credentials::default());
        assert_eq!(config.profile_delay(), Duration::from_secs(1));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_file_then_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"base_url": "http://api.local/api", "profile_delay_ms": 250}"#).unwrap();

        let mut config = Config::load_from(&path).unwrap();
        assert_eq!(config.base_url, "http://api.local/api");
        assert_eq!(config.profile_delay_ms, 250);
        assert_eq!(config.email, DEFAULT_EMAIL);

        let env: HashMap<&str, &str> = [(ENV_BASE_URL, "http://env.local/api"), (ENV_EMAIL, "x@y.z")]
            .into_iter()
            .collect();
        config.apply_env(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.base_url, "http://env.local/api");
        assert_eq!(config.email, "x@y.z");
        assert_eq!(config.profile_delay_ms, 250);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config.origin, DEFAULT_ORIGIN);
    }

    #[test]
    fn test_bad_env_number() {
        let mut config = Config::default();
        let err = config
            .apply_env(|k| (k == ENV_DELAY_MS).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_DELAY_MS));
    }
}
