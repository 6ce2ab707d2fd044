//! Configuration loading for Oncohub.
//! Reads oncohub.toml from the current directory or the path in ONCOHUB_CONFIG.
//! Client credentials can be supplied through ONCOHUB_CLIENT_ID / ONCOHUB_CLIENT_SECRET.

use std::path::Path;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub use oncohub_evidence::EvidenceDefaults;

pub const CONFIG_ENV: &str = "ONCOHUB_CONFIG";
pub const CLIENT_ID_ENV: &str = "ONCOHUB_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "ONCOHUB_CLIENT_SECRET";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config file {path}: {source}")]
    Io { path: String, source: std::io::Error },

    #[error("Invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub fhir: FhirConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub evidence: EvidenceDefaults,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FhirConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing)]
    pub client_secret: Option<SecretString>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url()     -> String { "https://fhir.epic.com/interconnect-fhir-oauth/api/FHIR/R4/".to_string() }
fn default_token_url()    -> String { "https://fhir.epic.com/interconnect-fhir-oauth/oauth2/token".to_string() }
fn default_timeout_secs() -> u64    { 30 }

impl Default for FhirConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_url: default_token_url(),
            client_id: None,
            client_secret: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Bounded retry with exponential backoff for transient report-fetch failures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_max_attempts()       -> u32 { 3 }
fn default_initial_backoff_ms() -> u64 { 500 }
fn default_max_backoff_ms()     -> u64 { 8_000 }
fn default_multiplier()         -> f64 { 2.0 }

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            multiplier: default_multiplier(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_path")]
    pub default_path: String,
}

fn default_export_path() -> String { "beaker_report_data.csv".to_string() }

impl Default for ExportConfig {
    fn default() -> Self {
        Self { default_path: default_export_path() }
    }
}


impl Config {
    /// Load configuration from oncohub.toml.
    /// Checks ONCOHUB_CONFIG first, then the current directory. A missing file
    /// falls back to defaults; credentials may then come from the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| "oncohub.toml".to_string());

        let mut config = if Path::new(&path).exists() {
            Self::load_from(&path)?
        } else {
            warn!(path = %path, "Config file not found, using defaults");
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded config file");
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Credential overrides from an environment-like lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(id) = lookup(CLIENT_ID_ENV).filter(|v| !v.is_empty()) {
            self.fhir.client_id = Some(id);
        }
        if let Some(secret) = lookup(CLIENT_SECRET_ENV).filter(|v| !v.is_empty()) {
            self.fhir.client_secret = Some(SecretString::from(secret));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.evidence.validate().map_err(ConfigError::Invalid)?;
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid("retry.max_attempts must be at least 1".to_string()));
        }
        if self.retry.multiplier < 1.0 {
            return Err(ConfigError::Invalid("retry.multiplier must be >= 1.0".to_string()));
        }
        if self.fhir.timeout_secs == 0 {
            return Err(ConfigError::Invalid("fhir.timeout_secs must be at least 1".to_string()));
        }
        Ok(())
    }
}
