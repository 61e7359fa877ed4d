//! Configuration for EC2 target discovery.
//!
//! A TOML file plus `EC2SD_*` environment overrides, validated and
//! translated into `ec2sd_core::DiscoveryConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ec2sd_core::{Credentials, DiscoveryConfig};

/// Environment variable prefix for overrides (`EC2SD_REGION`, ...).
pub const ENV_PREFIX: &str = "EC2SD_";

const REDACTED: &str = "<redacted>";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl ConfigError {
    fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── TOML config struct ──────────────────────────────────────────────

/// The `ec2_sd` settings of one discovery job.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Ec2SdConfig {
    /// AWS region to query, e.g. `us-east-1`.
    #[serde(default)]
    pub region: String,

    /// Static access key. Must be paired with `secret_key`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,

    /// Static secret key (plaintext; prefer the default credential chain).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,

    /// Time between refreshes, in `humantime` notation (`60s`, `5m`).
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: String,

    /// Port scraped on each instance's private address.
    #[serde(default = "default_port")]
    pub port: u16,

    /// `key` or `key,value1,value2` expressions.
    #[serde(default)]
    pub tag_filters: Vec<String>,
}

impl Default for Ec2SdConfig {
    fn default() -> Self {
        Self {
            region: String::new(),
            access_key: None,
            secret_key: None,
            refresh_interval: default_refresh_interval(),
            port: default_port(),
            tag_filters: Vec::new(),
        }
    }
}

fn default_refresh_interval() -> String {
    "60s".into()
}
fn default_port() -> u16 {
    ec2sd_core::config::DEFAULT_PORT
}

impl Ec2SdConfig {
    /// Parsed, non-zero refresh interval.
    pub fn refresh_interval(&self) -> Result<Duration, ConfigError> {
        let interval = humantime::parse_duration(self.refresh_interval.trim())
            .map_err(|e| ConfigError::validation("refresh_interval", e.to_string()))?;
        if interval.is_zero() {
            return Err(ConfigError::validation(
                "refresh_interval",
                "must be greater than zero",
            ));
        }
        Ok(interval)
    }

    /// Check everything the engine cannot recover from.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region.trim().is_empty() {
            return Err(ConfigError::validation("region", "a region is required"));
        }

        self.refresh_interval()?;

        let has_access = self.access_key.as_deref().is_some_and(|k| !k.is_empty());
        let has_secret = self.secret_key.as_deref().is_some_and(|k| !k.is_empty());
        match (has_access, has_secret) {
            (true, false) => Err(ConfigError::validation(
                "secret_key",
                "access_key is set but secret_key is not",
            )),
            (false, true) => Err(ConfigError::validation(
                "access_key",
                "secret_key is set but access_key is not",
            )),
            _ => Ok(()),
        }
    }

    /// Validate and build the engine configuration.
    pub fn into_discovery_config(self) -> Result<DiscoveryConfig, ConfigError> {
        self.validate()?;
        let interval = self.refresh_interval()?;
        let credentials =
            Credentials::resolve(self.access_key, self.secret_key.map(SecretString::from));

        Ok(DiscoveryConfig::new(
            self.region,
            credentials,
            interval,
            self.port,
            &self.tag_filters,
        ))
    }

    /// TOML rendering with the secret key masked.
    pub fn to_redacted_toml(&self) -> Result<String, ConfigError> {
        let mut shown = self.clone();
        if shown.secret_key.is_some() {
            shown.secret_key = Some(REDACTED.into());
        }
        Ok(toml::to_string_pretty(&shown)?)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the default config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "ec2sd", "ec2sd").map_or_else(
        || PathBuf::from("ec2sd.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from `path` (or the default path) plus environment.
///
/// A missing file is not an error; defaults and environment still apply.
pub fn load_config(path: Option<&Path>) -> Result<Ec2SdConfig, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    let config = Figment::new()
        .merge(Serialized::defaults(Ec2SdConfig::default()))
        .merge(Toml::file_exact(&path))
        .merge(Env::prefixed(ENV_PREFIX))
        .extract()?;
    Ok(config)
}

