//! Shared helpers for command handlers.

use eg4mon_api::{Credentials, Eg4Client, Transport};
use eg4mon_core::{CoreError, MonitorConfig};

use crate::error::CliError;

/// Build a logged-out API client from the resolved monitor config.
pub fn client_for(config: &MonitorConfig) -> Result<Eg4Client, CliError> {
    let transport = Transport {
        verify_tls: config.verify_tls,
        timeout: config.timeout,
    };
    let credentials = Credentials::new(config.username.clone(), config.password.clone());
    Ok(Eg4Client::new(
        config.base_url.clone(),
        credentials,
        &transport,
    )?)
}

/// Turn the login-time "no inverter with serial" rejection into the
/// dedicated not-found error, which carries a `devices` hint.
pub fn tag_unknown_serial(err: CoreError, serial: &str) -> CliError {
    if let CoreError::Api(eg4mon_api::Error::Api { ref message }) = err {
        if message.contains("no inverter with serial") {
            return CliError::InverterNotFound {
                serial: serial.to_owned(),
            };
        }
    }
    err.into()
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}
