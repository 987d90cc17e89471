//! Holding-register read/write command handlers.

use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use eg4mon_api::{ApiResponse, InverterParameters};
use eg4mon_core::{Coordinator, MonitorConfig};

use crate::cli::{GlobalOpts, SettingsArgs, SettingsCommand, SettingsReadArgs};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    config: MonitorConfig,
    args: SettingsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut coordinator = Coordinator::from_config(&config)?;
    coordinator
        .ensure_logged_in()
        .await
        .map_err(|err| util::tag_unknown_serial(err, &config.serial_number))?;

    match args.command {
        SettingsCommand::Read(read_args) => read(&coordinator, &read_args, global).await,
        SettingsCommand::Write { param, value } => {
            write(&mut coordinator, &param, &value, global).await
        }
    }
}

#[derive(Serialize, Tabled)]
struct ParameterRow {
    #[tabled(rename = "PARAMETER")]
    name: String,
    #[tabled(rename = "VALUE")]
    value: String,
}

async fn read(
    coordinator: &Coordinator,
    args: &SettingsReadArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let params = fetch_parameters(coordinator.client()).await?;

    let rows: Vec<ParameterRow> = params
        .iter()
        .filter(|(name, _)| {
            args.filter
                .as_deref()
                .is_none_or(|f| name.to_lowercase().contains(&f.to_lowercase()))
        })
        .map(|(name, value)| ParameterRow {
            name: name.clone(),
            value: plain_value(value),
        })
        .collect();

    output::Renderer::from_opts(global).list(
        &rows,
        |row| ParameterRow {
            name: row.name.clone(),
            value: row.value.clone(),
        },
        |row| format!("{}={}", row.name, row.value),
    );
    Ok(())
}

async fn write(
    coordinator: &mut Coordinator,
    param: &str,
    value: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    // Validate the parameter name against a fresh read so typos fail
    // before anything is sent to the inverter.
    let params = fetch_parameters(coordinator.client()).await?;
    let previous = params
        .get(param)
        .ok_or_else(|| CliError::ParameterNotFound {
            name: param.to_owned(),
        })?;

    let prompt = format!(
        "Write {param} = {value} (currently {})? The inverter applies this immediately.",
        plain_value(previous)
    );
    if !util::confirm(&prompt, global.yes)? {
        return Ok(());
    }

    let accepted = coordinator.client().write_setting(param, value).await?;
    if !accepted {
        return Err(CliError::Rejected {
            message: format!("inverter refused to set {param}"),
        });
    }

    // Pull the settings back in so the gate timestamp reflects the write.
    coordinator.force_refresh_settings().await;

    if !global.quiet {
        eprintln!("{param} set to {value}");
    }
    Ok(())
}

async fn fetch_parameters(client: &eg4mon_api::Eg4Client) -> Result<InverterParameters, CliError> {
    match client.read_settings().await? {
        ApiResponse::Success(params) => Ok(params),
        ApiResponse::Failure { message } => Err(CliError::Rejected {
            message: message
                .unwrap_or_else(|| "the portal declined the parameter read".into()),
        }),
    }
}

/// Render a JSON value the way the portal sent it, minus string quoting.
fn plain_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
