//! Profile resolution with CLI flag overrides.
//!
//! Layering order (highest wins): command-line flags, `EG4_*` environment
//! variables (clap reads those into the flags), profile values from the
//! TOML config file, portal defaults.

use std::time::Duration;

use secrecy::SecretString;

use eg4mon_config::{Config, Profile, load_config_or_default, resolve_profile};
use eg4mon_core::MonitorConfig;
use eg4mon_core::config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// The profile name to use: `--profile` flag, then the config file's
/// `default_profile`, then `"default"`.
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `MonitorConfig` from the config file, profile, and CLI overrides.
///
/// `require_serial` is false for commands that operate on the whole account
/// (like `devices`) rather than one inverter.
pub fn build_monitor_config(
    global: &GlobalOpts,
    require_serial: bool,
) -> Result<MonitorConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        let mut merged = overlay(profile, global);
        if !require_serial && merged.serial_number.is_none() {
            merged.serial_number = Some(String::new());
        }
        return Ok(resolve_profile(&merged, &profile_name)?);
    }

    if global.profile.is_some() {
        let mut available: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
        available.sort_unstable();
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available.join(", "),
        });
    }

    // No config file at all -- build from flags / env vars alone.
    from_flags(global, &profile_name, require_serial)
}

/// Clone the profile with any credential-shaped flags merged in, so that
/// `resolve_profile`'s validation and defaulting see the final values.
fn overlay(profile: &Profile, global: &GlobalOpts) -> Profile {
    Profile {
        username: global.username.clone().or_else(|| profile.username.clone()),
        password: global.password.clone().or_else(|| profile.password.clone()),
        // An explicit --password outranks the profile's env-var indirection.
        password_env: if global.password.is_some() {
            None
        } else {
            profile.password_env.clone()
        },
        serial_number: global.serial.clone().or_else(|| profile.serial_number.clone()),
        base_url: global.base_url.clone().or_else(|| profile.base_url.clone()),
        ignore_tls: global.insecure || profile.ignore_tls,
        poll_interval_secs: profile.poll_interval_secs,
        settings_interval_secs: profile.settings_interval_secs,
        timeout_secs: global.timeout.or(profile.timeout_secs),
    }
}

fn from_flags(
    global: &GlobalOpts,
    profile_name: &str,
    require_serial: bool,
) -> Result<MonitorConfig, CliError> {
    let username = global
        .username
        .clone()
        .ok_or_else(|| CliError::NoCredentials {
            profile: profile_name.to_owned(),
        })?;
    let password = global
        .password
        .clone()
        .ok_or_else(|| CliError::NoCredentials {
            profile: profile_name.to_owned(),
        })?;
    let serial_number = match global.serial.clone() {
        Some(serial) => serial,
        None if !require_serial => String::new(),
        None => {
            return Err(CliError::Validation {
                field: "serial".into(),
                reason: "required when no profile is configured (--serial or EG4_SERIAL)".into(),
            });
        }
    };

    let mut config = MonitorConfig::new(username, SecretString::from(password), serial_number);
    config.base_url = parse_base_url(global.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;
    config.verify_tls = !global.insecure;
    config.timeout = global.timeout.map_or(DEFAULT_TIMEOUT, Duration::from_secs);
    Ok(config)
}

fn parse_base_url(raw: &str) -> Result<url::Url, CliError> {
    raw.parse().map_err(|_| CliError::Validation {
        field: "base_url".into(),
        reason: format!("invalid URL: {raw}"),
    })
}
