//! One-shot snapshot command handler.

use std::fmt::Write as _;

use eg4mon_core::{Coordinator, MonitorConfig, Snapshot};

use crate::cli::{GlobalOpts, StatusArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    config: MonitorConfig,
    args: StatusArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut coordinator = Coordinator::from_config(&config)?;
    let snapshot = coordinator.refresh().await?;

    output::Renderer::from_opts(global).single(
        &snapshot,
        |snap| detail(snap, args.settings),
        summary_line,
    );
    Ok(())
}

/// One line per snapshot, used by plain output and by `watch`.
pub fn summary_line(snap: &Snapshot) -> String {
    let status = snap
        .runtime
        .as_ref()
        .and_then(|r| r.status_text.clone())
        .unwrap_or_else(|| "unknown".into());
    let pv = telemetry_watt(snap, |r| r.pv_charge_power);
    let load = telemetry_watt(snap, |r| r.consumption_power);
    let soc = snap
        .battery
        .as_ref()
        .and_then(|b| b.battery_units.first())
        .and_then(|u| u.soc)
        .map_or_else(|| "--".into(), |v| format!("{v}%"));
    let degraded = if snap.degraded { " [cached]" } else { "" };

    format!(
        "{}  {status}  pv={pv}  load={load}  soc={soc}{degraded}",
        snap.taken_at.format("%H:%M:%S")
    )
}

fn telemetry_watt(
    snap: &Snapshot,
    field: impl Fn(&eg4mon_api::RuntimeData) -> Option<f64>,
) -> String {
    snap.runtime
        .as_ref()
        .and_then(field)
        .map_or_else(|| "--".into(), |v| format!("{v:.0}W"))
}

fn detail(snap: &Snapshot, include_settings: bool) -> String {
    let mut out = String::new();

    if let Some(ref inv) = snap.inverter {
        line(&mut out, "Inverter", &inv.serial_num);
        if let Some(ref plant) = inv.plant_name {
            line(&mut out, "Plant", plant);
        }
        if let Some(ref fw) = inv.fw_version {
            line(&mut out, "Firmware", fw);
        }
    }

    if let Some(ref rt) = snap.runtime {
        if let Some(ref status) = rt.status_text {
            line(&mut out, "Status", status);
        }
        line_watt(&mut out, "PV charge", rt.pv_charge_power);
        line_watt(&mut out, "Discharge", rt.discharge_power);
        line_watt(&mut out, "Load", rt.consumption_power);
        line_watt(&mut out, "To grid", rt.to_grid_power);
        line_watt(&mut out, "From grid", rt.to_user_power);
        line_watt(&mut out, "EPS", rt.eps_power);
    } else {
        line(&mut out, "Runtime", "(unavailable)");
    }

    line_kwh(&mut out, "Yield today", snap.energy.today_yielding);
    line_kwh(&mut out, "Yield total", snap.energy.total_yielding);
    line_kwh(&mut out, "Usage today", snap.energy.today_usage);

    if let Some(ref bat) = snap.battery {
        if let Some(remain) = bat.remain_capacity {
            line(&mut out, "Battery remaining", &format!("{remain:.1} Ah"));
        }
        for unit in &bat.battery_units {
            let name = unit
                .battery_sn
                .clone()
                .or_else(|| unit.battery_key.clone())
                .unwrap_or_else(|| "battery".into());
            let soc = unit.soc.map_or_else(|| "--".into(), |v| format!("{v}%"));
            let soh = unit.soh.map_or_else(|| "--".into(), |v| format!("{v}%"));
            line(&mut out, &name, &format!("soc {soc}  soh {soh}"));
        }
    }

    if include_settings {
        match snap.settings {
            Some(ref params) => {
                let _ = writeln!(out);
                for (name, value) in params.iter() {
                    line(&mut out, name, &value.to_string());
                }
            }
            None => line(&mut out, "Settings", "(unavailable)"),
        }
    }

    if snap.degraded {
        let _ = writeln!(out);
        let _ = write!(out, "Some values were served from cache.");
    }

    out.trim_end().to_owned()
}

fn line(out: &mut String, label: &str, value: &str) {
    // Pad before colorizing so ANSI codes don't skew the column width.
    let padded = format!("{label:<18}");
    let _ = writeln!(out, "{} {value}", output::label(&padded));
}

fn line_watt(out: &mut String, label: &str, value: Option<f64>) {
    if let Some(v) = value {
        line(out, label, &format!("{v:.0} W"));
    }
}

fn line_kwh(out: &mut String, label: &str, value: Option<f64>) {
    if let Some(v) = value {
        line(out, label, &format!("{v:.1} kWh"));
    }
}
