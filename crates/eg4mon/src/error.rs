//! CLI error types with miette diagnostics.
//!
//! Maps core and config errors into user-facing errors with actionable
//! help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use eg4mon_config::ConfigError;
use eg4mon_core::CoreError;

/// Process exit codes for the failure paths; success exits normally.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the monitoring portal")]
    #[diagnostic(
        code(eg4mon::connection_failed),
        help(
            "Check your network connection and the portal base URL.\n\
             For a portal with a self-signed certificate, add --insecure (-k)."
        )
    )]
    ConnectionFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(eg4mon::auth_failed),
        help(
            "Verify the username and password for this profile.\n\
             Run: eg4mon config init   to rewrite the profile."
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(eg4mon::no_credentials),
        help(
            "Configure credentials with: eg4mon config init\n\
             Or set the EG4_USERNAME and EG4_PASSWORD environment variables."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("Inverter '{serial}' not found in the account")]
    #[diagnostic(
        code(eg4mon::not_found),
        help("Run: eg4mon devices   to see the inverters this account can reach")
    )]
    InverterNotFound { serial: String },

    #[error("Parameter '{name}' is not present on this inverter")]
    #[diagnostic(
        code(eg4mon::parameter_not_found),
        help("Run: eg4mon settings read   to list the available parameters")
    )]
    ParameterNotFound { name: String },

    // ── API ──────────────────────────────────────────────────────────

    #[error("The portal rejected the request: {message}")]
    #[diagnostic(code(eg4mon::rejected))]
    Rejected { message: String },

    #[error("Update failed: {message}")]
    #[diagnostic(
        code(eg4mon::update_failed),
        help("The portal answered but a mandatory dataset was missing. Try again shortly.")
    )]
    UpdateFailed { message: String },

    // ── Validation / configuration ───────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(eg4mon::validation))]
    Validation { field: String, reason: String },

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(eg4mon::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: eg4mon config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(eg4mon::config))]
    Config(ConfigError),

    // ── IO ───────────────────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::InverterNotFound { .. } | Self::ParameterNotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Error mappings ───────────────────────────────────────────────────

impl From<eg4mon_api::Error> for CliError {
    fn from(err: eg4mon_api::Error) -> Self {
        match err {
            eg4mon_api::Error::Authentication { message } => Self::AuthFailed { message },
            eg4mon_api::Error::Transport(source) => Self::ConnectionFailed {
                source: source.into(),
            },
            eg4mon_api::Error::InvalidUrl(source) => Self::Validation {
                field: "base_url".into(),
                reason: source.to_string(),
            },
            eg4mon_api::Error::Api { message } => Self::Rejected { message },
            eg4mon_api::Error::Deserialization { message, .. } => Self::Rejected { message },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Api(api) => api.into(),
            CoreError::UpdateFailed { message } => Self::UpdateFailed { message },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}
