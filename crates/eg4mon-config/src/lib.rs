//! Shared configuration for the EG4 monitor CLI.
//!
//! TOML profiles, credential resolution (env var or plaintext), and
//! translation into [`eg4mon_core::MonitorConfig`]. The CLI layers
//! flag-aware overrides on top.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use eg4mon_core::MonitorConfig;
use eg4mon_core::config::{
    DEFAULT_BASE_URL, DEFAULT_POLL_INTERVAL, DEFAULT_SETTINGS_INTERVAL, DEFAULT_TIMEOUT,
};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Named inverter profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            profiles: HashMap::new(),
        }
    }
}

/// A named inverter profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Portal account username.
    pub username: Option<String>,

    /// Portal account password (plaintext -- prefer `password_env`).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Serial number of the inverter to monitor.
    pub serial_number: Option<String>,

    /// Portal base URL.
    pub base_url: Option<String>,

    /// Skip TLS certificate verification.
    #[serde(default)]
    pub ignore_tls: bool,

    /// Telemetry poll interval in seconds.
    pub poll_interval_secs: Option<u64>,

    /// Settings poll interval in seconds.
    pub settings_interval_secs: Option<u64>,

    /// Per-request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "eg4mon", "eg4mon").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("eg4mon");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment (`EG4_*` overrides).
pub fn load_config() -> Result<Config, ConfigError> {
    let path = config_path();

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("EG4_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the password for a profile: named env var first, then the
/// plaintext TOML value.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Some(ref var) = profile.password_env {
        if let Ok(value) = std::env::var(var) {
            return Ok(SecretString::from(value));
        }
    }
    if let Some(ref password) = profile.password {
        return Ok(SecretString::from(password.clone()));
    }
    Err(ConfigError::NoCredentials {
        profile: profile_name.to_owned(),
    })
}

// ── Profile resolution ──────────────────────────────────────────────

/// Translate a `Profile` into the core's `MonitorConfig`.
pub fn resolve_profile(profile: &Profile, profile_name: &str) -> Result<MonitorConfig, ConfigError> {
    let username = profile
        .username
        .clone()
        .ok_or_else(|| ConfigError::Validation {
            field: "username".into(),
            reason: format!("missing in profile '{profile_name}'"),
        })?;

    let password = resolve_password(profile, profile_name)?;

    let serial_number = profile
        .serial_number
        .clone()
        .ok_or_else(|| ConfigError::Validation {
            field: "serial_number".into(),
            reason: format!("missing in profile '{profile_name}'"),
        })?;

    let base_url_str = profile.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
    let base_url = base_url_str
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "base_url".into(),
            reason: format!("invalid URL: {base_url_str}"),
        })?;

    Ok(MonitorConfig {
        base_url,
        username,
        password,
        serial_number,
        verify_tls: !profile.ignore_tls,
        poll_interval: profile
            .poll_interval_secs
            .map_or(DEFAULT_POLL_INTERVAL, Duration::from_secs),
        settings_interval: profile
            .settings_interval_secs
            .map_or(DEFAULT_SETTINGS_INTERVAL, Duration::from_secs),
        timeout: profile
            .timeout_secs
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs),
    })
}
