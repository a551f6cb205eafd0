//! Runtime configuration.
//!
//! Resolved once at startup and passed into the services that need it.
//! Nothing below reads the environment after construction.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const ENV_REMOTE_URL: &str = "ONCOTRACK_REMOTE_URL";
pub const ENV_REMOTE_KEY: &str = "ONCOTRACK_REMOTE_KEY";
pub const ENV_INSIGHT_KEY: &str = "ONCOTRACK_INSIGHT_KEY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Hosted table settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RemoteConfig {
    /// Project URL, e.g. `https://project.example.co`
    pub url: String,
    pub api_key: String,
    pub table: String,
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            table: "patients".into(),
            timeout_secs: 10,
        }
    }
}

impl RemoteConfig {
    /// A remote with no URL means the app runs against the local cache only.
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

/// Insight endpoint settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct InsightConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com".into(),
            api_key: String::new(),
            model: "gemini-3-flash-preview".into(),
            timeout_secs: 30,
        }
    }
}

impl InsightConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// The single ward login.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoginConfig {
    pub doctor_id: String,
    pub password: String,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            doctor_id: "docid".into(),
            password: "123456".into(),
        }
    }
}

/// Core configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoreConfig {
    /// SQLite file holding the local cache, outbox and settings
    pub database_path: PathBuf,
    pub remote: RemoteConfig,
    pub insight: InsightConfig,
    pub login: LoginConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("oncotrack.db"),
            remote: RemoteConfig::default(),
            insight: InsightConfig::default(),
            login: LoginConfig::default(),
        }
    }
}

impl CoreConfig {
    /// Parse TOML configuration.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let config: CoreConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Apply `ONCOTRACK_*` overrides from the process environment,
    /// loading a `.env` file first if one exists.
    pub fn with_env_overrides(self) -> ConfigResult<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "ignoring unreadable .env file");
            }
        }
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_REMOTE_URL) {
            self.remote.url = url;
        }
        if let Some(key) = lookup(ENV_REMOTE_KEY) {
            self.remote.api_key = key;
        }
        if let Some(key) = lookup(ENV_INSIGHT_KEY) {
            self.insight.api_key = key;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.remote.table.trim().is_empty() {
            return Err(ConfigError::Invalid("remote.table cannot be empty".into()));
        }
        if self.remote.timeout_secs == 0 {
            return Err(ConfigError::Invalid("remote.timeout_secs must be positive".into()));
        }
        if self.remote.is_configured() && self.remote.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "remote.api_key is required when remote.url is set".into(),
            ));
        }
        if self.login.doctor_id.trim().is_empty() || self.login.password.is_empty() {
            return Err(ConfigError::Invalid("login credentials cannot be empty".into()));
        }
        Ok(())
    }
}
