//! Wire models for the EG4 cloud API.
//!
//! The portal's JSON bodies are only partially documented and grow fields
//! between firmware releases, so every dataset follows the same shape: a
//! fixed typed subset plus a `#[serde(flatten)]` catch-all map that captures
//! everything else verbatim. [`DatasetFields::field`] gives callers one
//! well-defined lookup chain (typed field, then extension map, then `None`)
//! instead of ad-hoc fallbacks.

use std::collections::{BTreeMap, HashMap};

use secrecy::SecretString;
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Credentials ─────────────────────────────────────────────────────

/// Account credentials for the monitor portal.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

// ── Response carrier ────────────────────────────────────────────────

/// Outcome of a well-formed request.
///
/// The portal answers rejected requests with HTTP 200 and `success: false`
/// in the body. That is not a transport or auth problem, so it is carried
/// here as data rather than as an [`Error`](crate::Error) -- the coordinator
/// treats it as a "no data" signal and falls back to its cache.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<T> {
    /// `success: true` -- the parsed dataset.
    Success(T),
    /// `success: false` -- the server's error message, when it sent one.
    Failure { message: Option<String> },
}

impl<T> ApiResponse<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The dataset, discarding the failure message.
    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Success(data) => Some(data),
            Self::Failure { .. } => None,
        }
    }

    /// The server's error message for a failure, if any.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure { message } => message.as_deref(),
        }
    }
}

// ── Field lookup ────────────────────────────────────────────────────

/// Uniform accessor over typed fields and the flattened extension map.
///
/// Serializing re-flattens both into the wire namespace, so a single lookup
/// covers the whole chain. `null` typed fields are treated as absent.
pub trait DatasetFields: Serialize {
    fn field(&self, key: &str) -> Option<Value> {
        let value = serde_json::to_value(self).ok()?;
        value.get(key).filter(|v| !v.is_null()).cloned()
    }
}

// ── Device directory ────────────────────────────────────────────────

/// One entry of the device directory, built from the login response.
///
/// The core field set mirrors what the portal reliably sends per inverter;
/// anything else lands in `extra`. `plant_id` / `plant_name` come from the
/// enclosing plant object and are filled in by the client after parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inverter {
    #[serde(default)]
    pub plant_id: Option<String>,
    #[serde(default)]
    pub plant_name: Option<String>,
    pub serial_num: String,
    #[serde(default)]
    pub phase: Option<i64>,
    #[serde(default)]
    pub dtc: Option<i64>,
    #[serde(default)]
    pub device_type: Option<i64>,
    #[serde(default)]
    pub sub_device_type: Option<i64>,
    #[serde(default)]
    pub battery_type: Option<String>,
    #[serde(default)]
    pub standard: Option<String>,
    #[serde(default)]
    pub fw_version: Option<String>,
    #[serde(default)]
    pub slave_version: Option<String>,
    #[serde(default)]
    pub hardware_version: Option<String>,
    #[serde(default)]
    pub volt_class: Option<String>,
    #[serde(default)]
    pub machine_type: Option<String>,
    #[serde(default)]
    pub protocol_version: Option<i64>,
    #[serde(default, rename = "allowExport2Grid")]
    pub allow_export_to_grid: Option<Value>,
    #[serde(default)]
    pub allow_gen_exercise: Option<Value>,
    #[serde(default, rename = "withbatteryData")]
    pub with_battery_data: Option<Value>,
    /// Catch-all for additional fields not modeled above.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl DatasetFields for Inverter {}

/// Login response body: `success` plus a nested plant list.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub plants: Vec<Plant>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Plant {
    #[serde(default, deserialize_with = "id_as_string")]
    pub plant_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub inverters: Vec<Inverter>,
}

/// The portal is inconsistent about id types (string vs. number).
fn id_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    }))
}

// ── Telemetry datasets ──────────────────────────────────────────────

/// Live operating state of the inverter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeData {
    #[serde(default)]
    pub status_text: Option<String>,
    #[serde(default)]
    pub battery_type: Option<String>,
    #[serde(default)]
    pub bat_parallel_num: Option<i64>,
    #[serde(default)]
    pub bat_capacity: Option<f64>,
    #[serde(default)]
    pub consumption_power: Option<f64>,
    #[serde(default)]
    pub vpv1: Option<f64>,
    #[serde(default)]
    pub vpv2: Option<f64>,
    #[serde(default)]
    pub vpv3: Option<f64>,
    #[serde(default)]
    pub vpv4: Option<f64>,
    #[serde(default, rename = "ppvpCharge")]
    pub pv_charge_power: Option<f64>,
    #[serde(default, rename = "pDisCharge")]
    pub discharge_power: Option<f64>,
    #[serde(default, rename = "peps")]
    pub eps_power: Option<f64>,
    #[serde(default, rename = "pToGrid")]
    pub to_grid_power: Option<f64>,
    #[serde(default, rename = "pToUser")]
    pub to_user_power: Option<f64>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl DatasetFields for RuntimeData {}

/// Accumulated energy counters (daily and lifetime).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyData {
    #[serde(default)]
    pub today_yielding: Option<f64>,
    #[serde(default)]
    pub total_yielding: Option<f64>,
    #[serde(default)]
    pub today_charging: Option<f64>,
    #[serde(default)]
    pub total_charging: Option<f64>,
    #[serde(default)]
    pub today_discharging: Option<f64>,
    #[serde(default)]
    pub total_discharging: Option<f64>,
    #[serde(default)]
    pub today_import: Option<f64>,
    #[serde(default)]
    pub total_import: Option<f64>,
    #[serde(default)]
    pub today_export: Option<f64>,
    #[serde(default)]
    pub total_export: Option<f64>,
    #[serde(default)]
    pub today_usage: Option<f64>,
    #[serde(default)]
    pub total_usage: Option<f64>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl DatasetFields for EnergyData {}

/// Battery bank summary plus the per-unit records from `batteryArray`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryData {
    #[serde(default)]
    pub remain_capacity: Option<f64>,
    #[serde(default)]
    pub full_capacity: Option<f64>,
    #[serde(default)]
    pub total_number: Option<i64>,
    #[serde(default)]
    pub total_voltage_text: Option<String>,
    #[serde(default)]
    pub current_text: Option<String>,
    #[serde(default, rename = "batteryArray")]
    pub battery_units: Vec<BatteryUnit>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl DatasetFields for BatteryData {}

impl BatteryData {
    /// Look up one battery unit by its index within the bank.
    pub fn unit(&self, index: i64) -> Option<&BatteryUnit> {
        self.battery_units
            .iter()
            .find(|unit| unit.bat_index == Some(index))
    }
}

/// One physical battery module within the bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryUnit {
    #[serde(default)]
    pub battery_key: Option<String>,
    #[serde(default)]
    pub bat_index: Option<i64>,
    #[serde(default)]
    pub battery_sn: Option<String>,
    #[serde(default)]
    pub total_voltage: Option<f64>,
    #[serde(default)]
    pub current: Option<f64>,
    #[serde(default)]
    pub soc: Option<i64>,
    #[serde(default)]
    pub soh: Option<i64>,
    #[serde(default)]
    pub cycle_cnt: Option<i64>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl DatasetFields for BatteryUnit {}

// ── Parameters ──────────────────────────────────────────────────────

/// Request-framing keys that are echoed back in every read window and
/// are not inverter settings.
const PARAMETER_FRAMING_KEYS: [&str; 5] = [
    "success",
    "valueFrame",
    "inverterSn",
    "startRegister",
    "pointNumber",
];

/// Holding-register settings accumulated across the read windows.
///
/// The register names are free-form and firmware-dependent, so this is a
/// pure mapping; ordering is kept stable for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InverterParameters {
    #[serde(flatten)]
    fields: BTreeMap<String, Value>,
}

impl InverterParameters {
    /// Merge one read-window body into the accumulated parameters,
    /// dropping the request-framing keys.
    pub(crate) fn absorb(&mut self, window: Map<String, Value>) {
        for (key, value) in window {
            if !PARAMETER_FRAMING_KEYS.contains(&key.as_str()) {
                self.fields.insert(key, value);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn unknown_runtime_fields_land_in_extra() {
        let runtime: RuntimeData = serde_json::from_value(json!({
            "success": true,
            "statusText": "Normal",
            "vpv1": 3050.0,
            "fac": 5998,
        }))
        .expect("runtime should parse");

        assert_eq!(runtime.status_text.as_deref(), Some("Normal"));
        assert_eq!(runtime.vpv1, Some(3050.0));
        assert_eq!(runtime.extra.get("fac"), Some(&json!(5998)));
    }

    #[test]
    fn field_lookup_chains_typed_then_extra() {
        let runtime: RuntimeData = serde_json::from_value(json!({
            "statusText": "Normal",
            "fac": 5998,
        }))
        .expect("runtime should parse");

        assert_eq!(runtime.field("statusText"), Some(json!("Normal")));
        assert_eq!(runtime.field("fac"), Some(json!(5998)));
        // Typed but absent -> None, not Some(null).
        assert_eq!(runtime.field("vpv1"), None);
        assert_eq!(runtime.field("nonexistent"), None);
    }

    #[test]
    fn parameters_absorb_skips_framing_keys() {
        let mut parameters = InverterParameters::default();
        let window = json!({
            "success": true,
            "inverterSn": "1234567890",
            "startRegister": 0,
            "pointNumber": 127,
            "valueFrame": "aabbcc",
            "HOLD_GRID_VOLT_CONN_LOW": "184.0",
        });
        let Value::Object(map) = window else {
            unreachable!()
        };
        parameters.absorb(map);

        assert_eq!(parameters.len(), 1);
        assert_eq!(
            parameters.get("HOLD_GRID_VOLT_CONN_LOW"),
            Some(&json!("184.0"))
        );
        assert_eq!(parameters.get("inverterSn"), None);
    }

    #[test]
    fn battery_units_parse_from_battery_array() {
        let battery: BatteryData = serde_json::from_value(json!({
            "remainCapacity": 200.0,
            "fullCapacity": 200.0,
            "totalNumber": 2,
            "batteryArray": [
                { "batIndex": 1, "batterySn": "BAT001", "soc": 87 },
                { "batIndex": 2, "batterySn": "BAT002", "soc": 88 },
            ],
        }))
        .expect("battery should parse");

        assert_eq!(battery.battery_units.len(), 2);
        assert_eq!(
            battery.unit(2).and_then(|u| u.battery_sn.as_deref()),
            Some("BAT002")
        );
        assert_eq!(battery.unit(3).map(|u| u.bat_index), None);
    }
}
