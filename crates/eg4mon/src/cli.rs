//! Clap derive structures for the `eg4mon` CLI.
//!
//! Defines the command tree, global flags, and shared enums.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// eg4mon -- poll and configure EG4 inverters through the cloud portal
#[derive(Debug, Parser)]
#[command(
    name = "eg4mon",
    version,
    about = "Monitor EG4 inverters from the command line",
    long_about = "Polls the EG4 monitoring portal for runtime, energy, and battery\n\
        telemetry, and reads or writes inverter holding registers.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Inverter profile to use
    #[arg(long, short = 'p', env = "EG4_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Portal base URL (overrides profile)
    #[arg(long, env = "EG4_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Inverter serial number (overrides profile)
    #[arg(long, short = 's', env = "EG4_SERIAL", global = true)]
    pub serial: Option<String>,

    /// Portal account username (overrides profile)
    #[arg(long, short = 'u', env = "EG4_USERNAME", global = true)]
    pub username: Option<String>,

    /// Portal account password
    #[arg(long, env = "EG4_PASSWORD", global = true, hide_env = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "EG4_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "EG4_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "EG4_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output Format ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List inverters visible to the account
    #[command(alias = "dev", alias = "d")]
    Devices,

    /// Fetch one full snapshot and print it
    #[command(alias = "st")]
    Status(StatusArgs),

    /// Poll continuously and print each snapshot until interrupted
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Read or write inverter holding registers
    #[command(alias = "set")]
    Settings(SettingsArgs),

    /// Manage configuration profiles
    Config(ConfigArgs),
}

// ── Status ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Include the current inverter settings in the snapshot
    #[arg(long)]
    pub settings: bool,
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Poll interval in seconds (overrides profile)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,

    /// Stop after this many snapshots
    #[arg(long, short = 'n')]
    pub count: Option<u64>,
}

// ── Settings ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: SettingsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Read all holding registers
    Read(SettingsReadArgs),

    /// Write one holding register
    Write {
        /// Parameter name, e.g. HOLD_AC_CHARGE_POWER_CMD
        param: String,
        /// Value to write, as the portal expects it
        value: String,
    },
}

#[derive(Debug, Args)]
pub struct SettingsReadArgs {
    /// Only show parameters whose name contains this substring
    #[arg(long, short = 'f')]
    pub filter: Option<String>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Write a starter config file with one profile
    Init {
        /// Profile name to create
        #[arg(long, default_value = "default")]
        name: String,
    },

    /// List configured profiles
    List,
}
