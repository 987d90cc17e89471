//! Device directory command handler.

use tabled::Tabled;

use eg4mon_core::MonitorConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "SERIAL")]
    serial: String,
    #[tabled(rename = "PLANT")]
    plant: String,
    #[tabled(rename = "MODEL")]
    model: String,
    #[tabled(rename = "FIRMWARE")]
    firmware: String,
    #[tabled(rename = "BATTERY")]
    battery: String,
    #[tabled(rename = "PHASE")]
    phase: String,
}

pub async fn handle(config: MonitorConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let client = util::client_for(&config)?;
    client.login().await?;

    let inverters = client.inverters();
    output::Renderer::from_opts(global).list(
        &inverters,
        |inv| DeviceRow {
            serial: inv.serial_num.clone(),
            plant: inv.plant_name.clone().unwrap_or_default(),
            model: inv.machine_type.clone().unwrap_or_default(),
            firmware: inv.fw_version.clone().unwrap_or_default(),
            battery: inv.battery_type.clone().unwrap_or_default(),
            phase: inv.phase.map_or_else(String::new, |p| p.to_string()),
        },
        |inv| inv.serial_num.clone(),
    );
    Ok(())
}
