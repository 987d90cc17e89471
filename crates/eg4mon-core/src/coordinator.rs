// Refresh coordinator.
//
// One `refresh()` call is one tick: ensure login happened once, fetch the
// three telemetry datasets in fixed order with per-dataset cache fallback,
// run the interval-gated settings read, and assemble the snapshot. Cache
// slots are overwritten only after a fetch fully resolves, so a cancelled
// tick never leaves a slot half-updated.

use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use eg4mon_api::{
    ApiResponse, BatteryData, Credentials, Eg4Client, EnergyData, Error as ApiError,
    InverterParameters, RuntimeData, Selection, Transport,
};

use crate::config::MonitorConfig;
use crate::error::CoreError;
use crate::snapshot::Snapshot;

/// Drives periodic synchronization between the API client and consumers.
pub struct Coordinator {
    client: Eg4Client,
    serial_number: String,
    settings_interval: Duration,
    logged_in: bool,
    cached_runtime: Option<RuntimeData>,
    cached_battery: Option<BatteryData>,
    cached_energy: Option<EnergyData>,
    cached_settings: Option<InverterParameters>,
    last_settings_fetch: Option<Instant>,
}

impl Coordinator {
    /// Wrap an existing client. The serial is selected at the lazy first
    /// login, not here.
    pub fn new(client: Eg4Client, serial_number: String, settings_interval: Duration) -> Self {
        Self {
            client,
            serial_number,
            settings_interval,
            logged_in: false,
            cached_runtime: None,
            cached_battery: None,
            cached_energy: None,
            cached_settings: None,
            last_settings_fetch: None,
        }
    }

    /// Build the transport and client from a [`MonitorConfig`].
    pub fn from_config(config: &MonitorConfig) -> Result<Self, CoreError> {
        let transport = Transport {
            verify_tls: config.verify_tls,
            timeout: config.timeout,
        };
        let credentials = Credentials::new(config.username.clone(), config.password.clone());
        let client = Eg4Client::new(config.base_url.clone(), credentials, &transport)?;
        Ok(Self::new(
            client,
            config.serial_number.clone(),
            config.settings_interval,
        ))
    }

    /// The underlying client, for ad-hoc operations (e.g. writes).
    pub fn client(&self) -> &Eg4Client {
        &self.client
    }

    /// Login and select the configured inverter, once per coordinator
    /// life. Mid-life session expiry is handled inside the client, not
    /// here.
    pub async fn ensure_logged_in(&mut self) -> Result<(), CoreError> {
        if self.logged_in {
            return Ok(());
        }
        self.client.login().await?;
        self.client
            .select_inverter(&Selection::Serial(self.serial_number.clone()))?;
        self.logged_in = true;
        debug!(serial = %self.serial_number, "logged in and selected inverter");
        Ok(())
    }

    /// Run one tick and return the snapshot to publish.
    pub async fn refresh(&mut self) -> Result<Snapshot, CoreError> {
        self.ensure_logged_in().await?;

        let mut degraded = false;

        // Device info is always fresh from the directory; no cache exists
        // for it.
        let inverter = self.client.selected_inverter();

        let fetched = self.client.runtime().await;
        let runtime = resolve("runtime", fetched, &mut self.cached_runtime, &mut degraded);

        let fetched = self.client.battery().await;
        let battery = resolve("battery", fetched, &mut self.cached_battery, &mut degraded);

        let fetched = self.client.energy().await;
        let energy = resolve("energy", fetched, &mut self.cached_energy, &mut degraded)
            .ok_or_else(|| CoreError::UpdateFailed {
                message: "no energy data available (fetch failed and nothing cached)".into(),
            })?;

        // The settings gate runs strictly after telemetry, against the
        // time at gate check -- not tick start.
        let now = Instant::now();
        if settings_due(self.last_settings_fetch, now, self.settings_interval) {
            match self.client.read_settings().await {
                Ok(ApiResponse::Success(parameters)) => {
                    self.cached_settings = Some(parameters);
                    self.last_settings_fetch = Some(now);
                    debug!("settings refreshed");
                }
                Ok(ApiResponse::Failure { message }) => {
                    warn!(
                        error = message.as_deref().unwrap_or("no data"),
                        "settings read rejected; keeping previous settings"
                    );
                }
                Err(err) => {
                    warn!(error = %err, "settings read failed; keeping previous settings");
                }
            }
        }

        Ok(Snapshot {
            inverter,
            runtime,
            battery,
            energy,
            settings: self.cached_settings.clone(),
            degraded,
            taken_at: Utc::now(),
        })
    }

    /// Refresh settings immediately, bypassing the interval gate.
    ///
    /// Used right after a successful write so the new value shows up
    /// without waiting for the gate. Failures are logged, never raised.
    pub async fn force_refresh_settings(&mut self) {
        let now = Instant::now();
        match self.client.read_settings().await {
            Ok(ApiResponse::Success(parameters)) => {
                self.cached_settings = Some(parameters);
                self.last_settings_fetch = Some(now);
            }
            Ok(ApiResponse::Failure { message }) => {
                error!(
                    error = message.as_deref().unwrap_or("no data"),
                    "settings force-refresh rejected"
                );
            }
            Err(err) => {
                error!(error = %err, "settings force-refresh failed");
            }
        }
    }
}

/// Resolve one telemetry dataset: a successful fetch overwrites the cache,
/// anything else falls back to the cached value and marks the tick
/// degraded. Returns `None` only when there is no live value and nothing
/// cached.
fn resolve<T: Clone>(
    dataset: &str,
    fetched: Result<ApiResponse<T>, ApiError>,
    cache: &mut Option<T>,
    degraded: &mut bool,
) -> Option<T> {
    match fetched {
        Ok(ApiResponse::Success(data)) => {
            *cache = Some(data.clone());
            Some(data)
        }
        Ok(ApiResponse::Failure { message }) => {
            warn!(
                dataset,
                error = message.as_deref().unwrap_or("no data"),
                cached = cache.is_some(),
                "fetch rejected; falling back to cached value"
            );
            *degraded = true;
            cache.clone()
        }
        Err(err) => {
            warn!(
                dataset,
                error = %err,
                cached = cache.is_some(),
                "fetch failed; falling back to cached value"
            );
            *degraded = true;
            cache.clone()
        }
    }
}

/// The settings gate: due when never fetched, or when at least the
/// configured interval has elapsed since the last successful fetch.
fn settings_due(last_fetch: Option<Instant>, now: Instant, interval: Duration) -> bool {
    last_fetch.is_none_or(|last| now.duration_since(last) >= interval)
}
