//! Configuration management
//!
//! Config is stored at ~/.config/ktuvit-subs/config.toml.
//! Credentials are optional: without them only series subtitles are available.
//! The CLI layers KTUVIT_USERNAME / KTUVIT_PASSWORD over the file values at
//! startup ([`Config::with_env_overrides`]).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::api::KtuvitClient;
use crate::models::Credentials;

/// Title shown above the settings
pub const EDITOR_TITLE: &str = "Ktuvit Configuration";

/// Explains what the settings are for
pub const EDITOR_DESCRIPTION: &str = "Automatically downloads Hebrew subtitles from Ktuvit.me.\n\n\
     Login credentials (username and password) are only required for movie subtitles.\n\
     If credentials are not provided, series subtitles can still be downloaded.";

/// Exclusive upper bound for the request timeout, in seconds
pub const MAX_REQUEST_TIMEOUT_SECS: i64 = 30;

const USERNAME_ENV: &str = "KTUVIT_USERNAME";
const PASSWORD_ENV: &str = "KTUVIT_PASSWORD";

/// Validation failures, worded for whoever is editing the settings
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Request Timeout must be greater than 0 and lower than 30 seconds (got {0}).")]
    InvalidTimeout(i64),

    #[error("Ktuvit engine is not initialized.")]
    NotInitialized,

    #[error(
        "Could not reach Ktuvit.me with the request timeout configured ({0}). \
         Ktuvit.me might be unavailable, please try again later."
    )]
    Unreachable(String),

    #[error("Failed to authenticate Ktuvit.me ({0}). Please validate your credentials.")]
    AuthenticationFailed(String),
}

/// Application configuration
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Email address registered on Ktuvit.me
    pub username: Option<String>,
    pub password: Option<String>,
    /// Request timeout in seconds (default 5 for the reachability check)
    pub request_timeout: Option<i64>,
}

impl Config {
    /// Get config file path (~/.config/ktuvit-subs/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ktuvit-subs").join("config.toml"))
    }

    /// Load config from file, or return default if not found
    pub fn load() -> Self {
        Self::path()
            .and_then(|p| Self::load_from(&p).ok())
            .unwrap_or_default()
    }

    /// Load config from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Save config to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Starting point written by `config --init`
    pub fn template() -> Self {
        Self {
            username: Some(String::new()),
            password: Some(String::new()),
            request_timeout: None,
        }
    }

    /// Apply KTUVIT_USERNAME / KTUVIT_PASSWORD on top of the file values
    pub fn with_env_overrides(self) -> Self {
        self.with_credential_overrides(
            std::env::var(USERNAME_ENV).ok(),
            std::env::var(PASSWORD_ENV).ok(),
        )
    }

    /// Replace each stored credential that has an override
    pub fn with_credential_overrides(
        mut self,
        username: Option<String>,
        password: Option<String>,
    ) -> Self {
        if username.is_some() {
            self.username = username;
        }
        if password.is_some() {
            self.password = password;
        }
        self
    }

    /// Stored credentials; missing values are empty (series-only mode)
    pub fn credentials(&self) -> Credentials {
        Credentials::new(
            self.username.clone().unwrap_or_default(),
            self.password.clone().unwrap_or_default(),
        )
    }

    /// Configured timeout, if it is set and valid
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
            .filter(|&secs| is_valid_timeout(secs))
            .map(|secs| Duration::from_secs(secs as u64))
    }

    /// Local checks only
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.request_timeout {
            Some(secs) if !is_valid_timeout(secs) => Err(ConfigError::InvalidTimeout(secs)),
            _ => Ok(()),
        }
    }

    /// Full settings check: local validation, then (when credentials are
    /// set) a reachability probe and a login attempt against the live site.
    ///
    /// Blocks the calling thread until the remote checks finish.
    pub fn validate_remote(&self, engine: Option<&KtuvitClient>) -> Result<(), ConfigError> {
        let engine = engine.ok_or(ConfigError::NotInitialized)?;
        self.validate()?;

        let credentials = self.credentials();
        if credentials.is_empty() {
            // Series subtitles work without an account
            return Ok(());
        }

        let access = engine.check_access_blocking(self.request_timeout());
        if let Some(reason) = access.reason() {
            return Err(ConfigError::Unreachable(reason.to_string()));
        }

        let auth = engine.authenticate_blocking(&credentials);
        if let Some(reason) = auth.reason() {
            return Err(ConfigError::AuthenticationFailed(reason.to_string()));
        }

        Ok(())
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

fn is_valid_timeout(secs: i64) -> bool {
    secs > 0 && secs < MAX_REQUEST_TIMEOUT_SECS
}
