use chrono::{DateTime, Utc};
use serde::Serialize;

use eg4mon_api::{BatteryData, EnergyData, Inverter, InverterParameters, RuntimeData};

/// The combined dataset published after each successful tick.
///
/// The field types encode the degradation rules: `energy` is mandatory (a
/// tick without it never produces a snapshot), while `runtime`, `battery`,
/// and `settings` may be absent when neither a live value nor a cached one
/// exists. Read-only to consumers; a fresh snapshot replaces the previous
/// one wholesale.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Directory entry for the selected inverter. Always taken fresh from
    /// the device directory; never cached.
    pub inverter: Option<Inverter>,
    pub runtime: Option<RuntimeData>,
    pub battery: Option<BatteryData>,
    pub energy: EnergyData,
    /// Most recent settings read, which may be several telemetry ticks old.
    pub settings: Option<InverterParameters>,
    /// At least one dataset in this snapshot was served from cache.
    pub degraded: bool,
    pub taken_at: DateTime<Utc>,
}
