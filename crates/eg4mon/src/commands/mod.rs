//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod settings;
pub mod status;
pub mod util;
pub mod watch;

use eg4mon_core::MonitorConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a portal-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    config: MonitorConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Devices => devices::handle(config, global).await,
        Command::Status(args) => status::handle(config, args, global).await,
        Command::Watch(args) => watch::handle(config, args, global).await,
        Command::Settings(args) => settings::handle(config, args, global).await,
        // Config is handled before dispatch
        Command::Config(_) => unreachable!(),
    }
}
