// EG4 cloud API client.
//
// Owns the HTTP session (cookie jar), the device directory discovered at
// login, and the selected-inverter state. Every endpoint method funnels
// through `authenticated_post`, which performs the one-shot
// re-login-and-replay on a 401. Session state lives behind a std RwLock
// that is never held across an await point.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::error::Error;
use crate::models::{
    ApiResponse, BatteryData, Credentials, EnergyData, Inverter, InverterParameters, LoginResponse,
    RuntimeData,
};
use crate::transport::Transport;

const LOGIN_ENDPOINT: &str = "/WManage/api/login";
const RUNTIME_ENDPOINT: &str = "/WManage/api/inverter/getInverterRuntime";
const ENERGY_ENDPOINT: &str = "/WManage/api/inverter/getInverterEnergyInfo";
const BATTERY_ENDPOINT: &str = "/WManage/api/battery/getBatteryInfo";
const PARAMETER_READ_ENDPOINT: &str = "/WManage/web/maintain/remoteRead/read";
const PARAMETER_WRITE_ENDPOINT: &str = "/WManage/web/maintain/remoteSet/write";

/// Register windows covering the documented holding-register ranges.
/// Each read returns at most `pointNumber` registers, so the full settings
/// read is composed of six round trips.
const SETTINGS_REGISTER_WINDOWS: [u32; 6] = [0, 127, 240, 500, 2000, 5000];
const SETTINGS_WINDOW_SIZE: &str = "127";

/// How to pick the active inverter from the device directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Exact serial-number match.
    Serial(String),
    /// Positional index into the directory.
    Index(usize),
}

#[derive(Debug, Default)]
struct SessionState {
    logged_in: bool,
    inverters: Vec<Inverter>,
    selected_serial: Option<String>,
    selected_plant_id: Option<String>,
}

/// Async client for the EG4 inverter cloud API.
pub struct Eg4Client {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    session: RwLock<SessionState>,
}

impl Eg4Client {
    /// Create a client from transport settings. Does not log in --
    /// call [`login`](Self::login) first.
    pub fn new(
        base_url: Url,
        credentials: Credentials,
        transport: &Transport,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, credentials))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// The client must carry a cookie store; the session cookie set at
    /// login is what authenticates every later request.
    pub fn with_client(http: reqwest::Client, base_url: Url, credentials: Credentials) -> Self {
        Self {
            http,
            base_url,
            credentials,
            session: RwLock::new(SessionState::default()),
        }
    }

    /// The portal base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether a login has succeeded on this client.
    pub fn is_logged_in(&self) -> bool {
        self.session().logged_in
    }

    // ── Session lifecycle ────────────────────────────────────────────

    /// Authenticate and rebuild the device directory.
    ///
    /// A non-200 status or a missing/false `success` flag is an
    /// [`Error::Authentication`]. A successful login whose plant list
    /// contains no inverters is an [`Error::Api`] -- the credentials were
    /// fine, the account just has nothing to monitor.
    pub async fn login(&self) -> Result<(), Error> {
        let url = self.base_url.join(LOGIN_ENDPOINT)?;
        debug!(%url, "logging in");

        let params = [
            ("account", self.credentials.username.as_str()),
            ("password", self.credentials.password.expose_secret()),
        ];
        let response = self.http.post(url).form(&params).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}); check credentials"),
            });
        }

        let body = parse_json(response).await?;
        if !success_flag(&body) {
            return Err(Error::Authentication {
                message: "login rejected; check credentials".into(),
            });
        }

        let login: LoginResponse = from_body(body)?;
        let mut inverters = Vec::new();
        for plant in login.plants {
            for mut inverter in plant.inverters {
                inverter.plant_id.clone_from(&plant.plant_id);
                inverter.plant_name.clone_from(&plant.name);
                inverters.push(inverter);
            }
        }
        if inverters.is_empty() {
            return Err(Error::Api {
                message: "no inverters found in the login response".into(),
            });
        }

        info!(
            user = %self.credentials.username,
            inverters = inverters.len(),
            "login successful"
        );

        let mut session = self.session_mut();
        session.inverters = inverters;
        session.logged_in = true;
        Ok(())
    }

    /// Set the active inverter by serial number or directory index.
    ///
    /// Records the inverter's serial and parent plant id in the session;
    /// an unknown serial or out-of-bounds index is an [`Error::Api`].
    pub fn select_inverter(&self, selection: &Selection) -> Result<Inverter, Error> {
        let mut session = self.session_mut();
        let inverter = match selection {
            Selection::Serial(serial) => session
                .inverters
                .iter()
                .find(|inverter| inverter.serial_num == *serial)
                .cloned()
                .ok_or_else(|| Error::Api {
                    message: format!("no inverter with serial {serial}"),
                })?,
            Selection::Index(index) => {
                session
                    .inverters
                    .get(*index)
                    .cloned()
                    .ok_or_else(|| Error::Api {
                        message: format!(
                            "inverter index {index} out of bounds ({} available)",
                            session.inverters.len()
                        ),
                    })?
            }
        };

        session.selected_serial = Some(inverter.serial_num.clone());
        session.selected_plant_id.clone_from(&inverter.plant_id);
        debug!(serial = %inverter.serial_num, "inverter selected");
        Ok(inverter)
    }

    /// The device directory from the last successful login.
    pub fn inverters(&self) -> Vec<Inverter> {
        self.session().inverters.clone()
    }

    /// The directory entry for the currently selected inverter.
    pub fn selected_inverter(&self) -> Option<Inverter> {
        let session = self.session();
        let serial = session.selected_serial.as_ref()?;
        session
            .inverters
            .iter()
            .find(|inverter| &inverter.serial_num == serial)
            .cloned()
    }

    // ── Telemetry fetches ────────────────────────────────────────────

    /// Live runtime telemetry for the selected inverter.
    pub async fn runtime(&self) -> Result<ApiResponse<RuntimeData>, Error> {
        self.fetch_dataset(RUNTIME_ENDPOINT).await
    }

    /// Energy counters for the selected inverter.
    pub async fn energy(&self) -> Result<ApiResponse<EnergyData>, Error> {
        self.fetch_dataset(ENERGY_ENDPOINT).await
    }

    /// Battery bank summary including the per-unit records.
    pub async fn battery(&self) -> Result<ApiResponse<BatteryData>, Error> {
        self.fetch_dataset(BATTERY_ENDPOINT).await
    }

    async fn fetch_dataset<T: DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<ApiResponse<T>, Error> {
        let serial = self.selected_serial()?;
        let url = self.base_url.join(endpoint)?;
        let body = self
            .authenticated_post(url, &[("serialNum", serial.as_str())])
            .await?;

        if success_flag(&body) {
            Ok(ApiResponse::Success(from_body(body)?))
        } else {
            Ok(ApiResponse::Failure {
                message: server_error(&body),
            })
        }
    }

    // ── Parameters ───────────────────────────────────────────────────

    /// Read the inverter settings across all register windows.
    ///
    /// One logical operation composed of six round trips; the first window
    /// that reports failure aborts the read and nothing accumulated so far
    /// is returned. Partial settings are never valid.
    pub async fn read_settings(&self) -> Result<ApiResponse<InverterParameters>, Error> {
        let serial = self.selected_serial()?;
        let url = self.base_url.join(PARAMETER_READ_ENDPOINT)?;

        let mut parameters = InverterParameters::default();
        for start_register in SETTINGS_REGISTER_WINDOWS {
            let start = start_register.to_string();
            let params = [
                ("inverterSn", serial.as_str()),
                ("startRegister", start.as_str()),
                ("pointNumber", SETTINGS_WINDOW_SIZE),
                ("autoRetry", "true"),
            ];
            let body = self.authenticated_post(url.clone(), &params).await?;

            if !success_flag(&body) {
                return Ok(ApiResponse::Failure {
                    message: server_error(&body),
                });
            }
            if let Value::Object(window) = body {
                parameters.absorb(window);
            }
        }

        Ok(ApiResponse::Success(parameters))
    }

    /// Write a single holding register on the selected inverter.
    ///
    /// Returns the success flag from the response body.
    pub async fn write_setting(&self, hold_param: &str, value_text: &str) -> Result<bool, Error> {
        let serial = self.selected_serial()?;
        let url = self.base_url.join(PARAMETER_WRITE_ENDPOINT)?;
        let params = [
            ("inverterSn", serial.as_str()),
            ("holdParam", hold_param),
            ("valueText", value_text),
            ("clientType", "WEB"),
            ("remoteSetType", "NORMAL"),
        ];
        let body = self.authenticated_post(url, &params).await?;
        Ok(success_flag(&body))
    }

    // ── Request primitive ────────────────────────────────────────────

    /// Send an authenticated form POST and parse the JSON body.
    ///
    /// A 401 means the session cookie expired: re-login once and replay the
    /// request once. A non-200 on the replay, or any other non-200 on the
    /// initial response, is an [`Error::Api`]. At most one implicit
    /// re-login per call -- this never loops.
    async fn authenticated_post(&self, url: Url, params: &[(&str, &str)]) -> Result<Value, Error> {
        debug!(%url, "POST");

        let response = self.http.post(url.clone()).form(params).send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            debug!("session rejected (401); re-authenticating once");
            self.login().await?;

            let retry = self.http.post(url).form(params).send().await?;
            let status = retry.status();
            if !status.is_success() {
                return Err(Error::Api {
                    message: format!("request failed after re-login (HTTP {status})"),
                });
            }
            return parse_json(retry).await;
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                message: format!("request failed (HTTP {status}): {body}"),
            });
        }

        parse_json(response).await
    }

    fn selected_serial(&self) -> Result<String, Error> {
        self.session()
            .selected_serial
            .clone()
            .ok_or_else(|| Error::Api {
                message: "no inverter selected".into(),
            })
    }

    fn session(&self) -> RwLockReadGuard<'_, SessionState> {
        self.session.read().expect("session lock poisoned")
    }

    fn session_mut(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.session.write().expect("session lock poisoned")
    }
}

// ── Body helpers ────────────────────────────────────────────────────

fn success_flag(body: &Value) -> bool {
    body.get("success").and_then(Value::as_bool) == Some(true)
}

fn server_error(body: &Value) -> Option<String> {
    body.get("error")
        .or_else(|| body.get("msg"))
        .and_then(Value::as_str)
        .map(str::to_owned)
}

async fn parse_json(response: reqwest::Response) -> Result<Value, Error> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}

fn from_body<T: DeserializeOwned>(body: Value) -> Result<T, Error> {
    let raw = body.to_string();
    serde_json::from_value(body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: raw,
    })
}
