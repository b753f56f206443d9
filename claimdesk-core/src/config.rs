//! Configuration for claimdesk
//!
//! Sources, lowest priority first:
//! 1. built-in defaults
//! 2. `.env` in the current directory, then `~/.claimdesk/.env`
//!    (neither overrides variables that are already set)
//! 3. `~/.claimdesk/config.toml`, or the file named by `CLAIMDESK_CONFIG`
//! 4. environment variables (`SUPABASE_URL`, `SUPABASE_ANON_KEY`,
//!    `CLAIMDESK_BIND`, `CLAIMDESK_COOKIE_SECURE`, `CLAIMDESK_REQUEST_TIMEOUT`)

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::error::{DeskError, Result};

/// Effective configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    pub backend: BackendConfig,
    pub server: ServerSection,
}

/// Hosted backend project
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Project URL, e.g. https://xyzcompany.supabase.co
    pub url: Option<String>,
    /// Public anon key sent as `apikey` on every request
    pub anon_key: Option<String>,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("anon_key", &self.anon_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: SocketAddr,
    /// Add `Secure` to the session cookie (enable behind HTTPS)
    pub cookie_secure: bool,
    pub request_timeout_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            cookie_secure: false,
            request_timeout_secs: 30,
        }
    }
}

impl DeskConfig {
    /// Load `.env` files, the optional TOML file and environment overrides.
    pub fn load() -> Result<Self> {
        load_dotenv();

        let path = Self::config_path();
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            debug!("No config file at {}", path.display());
            Self::default()
        };

        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Config file path: `$CLAIMDESK_CONFIG` or `~/.claimdesk/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = env::var("CLAIMDESK_CONFIG") {
            return PathBuf::from(path);
        }
        config_dir()
            .unwrap_or_else(|| PathBuf::from(".claimdesk"))
            .join("config.toml")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = toml::from_str(&content).map_err(|e| DeskError::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = first_set(&lookup, &["SUPABASE_URL", "NEXT_PUBLIC_SUPABASE_URL"]) {
            self.backend.url = Some(url);
        }
        if let Some(key) = first_set(&lookup, &["SUPABASE_ANON_KEY", "NEXT_PUBLIC_SUPABASE_ANON_KEY"]) {
            self.backend.anon_key = Some(key);
        }
        if let Some(bind) = first_set(&lookup, &["CLAIMDESK_BIND"]) {
            self.server.bind = bind
                .parse()
                .map_err(|_| DeskError::config(format!("CLAIMDESK_BIND is not an address: {}", bind)))?;
        }
        if let Some(secure) = first_set(&lookup, &["CLAIMDESK_COOKIE_SECURE"]) {
            self.server.cookie_secure = matches!(secure.as_str(), "1" | "true" | "yes");
        }
        if let Some(timeout) = first_set(&lookup, &["CLAIMDESK_REQUEST_TIMEOUT"]) {
            self.server.request_timeout_secs = timeout.parse().map_err(|_| {
                DeskError::config(format!("CLAIMDESK_REQUEST_TIMEOUT is not a number: {}", timeout))
            })?;
        }
        Ok(())
    }

    /// Check that the backend project is fully configured.
    pub fn validate(&self) -> Result<(Url, String)> {
        let url = self
            .backend
            .url
            .as_deref()
            .ok_or_else(|| DeskError::config("SUPABASE_URL not set"))?;
        let url = Url::parse(url)
            .map_err(|e| DeskError::config(format!("SUPABASE_URL is not a valid URL: {}", e)))?;
        let key = self
            .backend
            .anon_key
            .clone()
            .ok_or_else(|| DeskError::config("SUPABASE_ANON_KEY not set"))?;
        Ok((url, key))
    }
}

/// First non-empty variable among `keys`
fn first_set<F>(lookup: &F, keys: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter()
        .find_map(|&key| lookup(key).filter(|value| !value.is_empty()))
}

/// Config directory (`~/.claimdesk`)
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".claimdesk"))
}

/// Load `.env` from the current directory and `~/.claimdesk/.env`.
pub fn load_dotenv() {
    let mut loaded_from = Vec::new();

    if let Ok(path) = dotenvy::dotenv() {
        loaded_from.push(path.display().to_string());
    }

    if let Some(env_file) = config_dir().map(|dir| dir.join(".env")) {
        if env_file.exists() {
            match dotenvy::from_path(&env_file) {
                Ok(()) => loaded_from.push(env_file.display().to_string()),
                Err(e) => debug!("Failed to load {}: {}", env_file.display(), e),
            }
        }
    }

    if loaded_from.is_empty() {
        debug!("No .env files found, using process environment only");
    } else {
        info!("Loaded environment from: {}", loaded_from.join(", "));
    }
}
