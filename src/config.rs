//! Configuration management
//!
//! Settings are layered: built-in defaults, then an optional JSON file, then
//! `QUEUE_ENROLLER_*` environment variables, then command-line flags.

use crate::error::{EnrollError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://damubala.kz";
pub const DEFAULT_SIGN_IN_PATH: &str = "/v1/Account/SignIn";
pub const DEFAULT_REGISTER_PATH: &str = "/v1/LinePosition/UpdateQueueV2";
pub const DEFAULT_IDENTIFIER_FIELD: &str = "iin";

const ENV_PREFIX: &str = "QUEUE_ENROLLER";

/// Remote service endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    pub sign_in_path: String,
    pub register_path: String,
    /// JSON key that carries the login in the sign-in body
    pub identifier_field: String,
    pub skip_tls: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            sign_in_path: DEFAULT_SIGN_IN_PATH.to_string(),
            register_path: DEFAULT_REGISTER_PATH.to_string(),
            identifier_field: DEFAULT_IDENTIFIER_FIELD.to_string(),
            skip_tls: false,
        }
    }
}

impl ServiceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn sign_in_url(&self) -> Result<url::Url> {
        self.endpoint(&self.sign_in_path)
    }

    pub fn register_url(&self) -> Result<url::Url> {
        self.endpoint(&self.register_path)
    }

    fn endpoint(&self, path: &str) -> Result<url::Url> {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(url::Url::parse(&format!("{}/{}", base, path))?)
    }

    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.base_url)?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(EnrollError::Validation(format!(
                "Invalid base URL: {}. Must start with http:// or https://",
                self.base_url
            )));
        }
        if self.sign_in_path.trim().is_empty() {
            return Err(EnrollError::Validation(
                "Sign-in path cannot be empty".to_string(),
            ));
        }
        if self.register_path.trim().is_empty() {
            return Err(EnrollError::Validation(
                "Registration path cannot be empty".to_string(),
            ));
        }
        if self.identifier_field.trim().is_empty() {
            return Err(EnrollError::Validation(
                "Identifier field cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Batch execution policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Per-call timeout in seconds; `None` waits indefinitely
    pub timeout_secs: Option<u64>,
    /// Maximum number of rows in flight at once
    pub concurrency: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            concurrency: 1,
        }
    }
}

impl RunConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(EnrollError::Validation(
                "concurrency must be greater than 0".to_string(),
            ));
        }
        if self.timeout_secs == Some(0) {
            return Err(EnrollError::Validation(
                "timeout must be greater than 0 when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub run: RunConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        self.service.validate()?;
        self.run.validate()
    }

    /// Load a JSON configuration file; absent keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EnrollError::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            EnrollError::Config(format!("Invalid config file {}: {}", path.display(), e))
        })
    }

    /// Apply `QUEUE_ENROLLER_*` environment variables on top of this config
    pub fn apply_env(self) -> Self {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_env_with<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}_{}", ENV_PREFIX, name));

        if let Some(val) = var("BASE_URL") {
            self.service.base_url = val;
        }
        if let Some(val) = var("TIMEOUT") {
            if let Ok(timeout) = val.parse() {
                self.run.timeout_secs = Some(timeout);
            }
        }
        if let Some(val) = var("CONCURRENCY") {
            if let Ok(concurrency) = val.parse() {
                self.run.concurrency = concurrency;
            }
        }
        if let Some(val) = var("SKIP_TLS") {
            self.service.skip_tls = val.to_lowercase() == "true" || val == "1";
        }

        self
    }

    /// Merge with another config, preferring non-default values
    pub fn merge(mut self, other: &AppConfig) -> Self {
        let default = AppConfig::default();

        if other.service.base_url != default.service.base_url {
            self.service.base_url = other.service.base_url.clone();
        }
        if other.service.sign_in_path != default.service.sign_in_path {
            self.service.sign_in_path = other.service.sign_in_path.clone();
        }
        if other.service.register_path != default.service.register_path {
            self.service.register_path = other.service.register_path.clone();
        }
        if other.service.identifier_field != default.service.identifier_field {
            self.service.identifier_field = other.service.identifier_field.clone();
        }
        if other.service.skip_tls != default.service.skip_tls {
            self.service.skip_tls = other.service.skip_tls;
        }
        if other.run.timeout_secs != default.run.timeout_secs {
            self.run.timeout_secs = other.run.timeout_secs;
        }
        if other.run.concurrency != default.run.concurrency {
            self.run.concurrency = other.run.concurrency;
        }

        self
    }
}
