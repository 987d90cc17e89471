// Monitor configuration.
//
// An explicit, dependency-injected context object: whoever owns the
// monitor's lifetime constructs one of these and passes it in. There is
// no process-global registry.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// Default portal base URL.
pub const DEFAULT_BASE_URL: &str = "https://monitor.eg4electronics.com";

/// Default telemetry poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Default interval for the expensive settings read. Settings change
/// rarely, so this is deliberately much longer than the telemetry poll.
pub const DEFAULT_SETTINGS_INTERVAL: Duration = Duration::from_secs(1200);

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything the monitor needs to poll one inverter.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Portal base URL.
    pub base_url: Url,
    /// Account username.
    pub username: String,
    /// Account password.
    pub password: SecretString,
    /// Serial number of the inverter to monitor.
    pub serial_number: String,
    /// Verify the portal's TLS certificate.
    pub verify_tls: bool,
    /// Telemetry poll interval.
    pub poll_interval: Duration,
    /// Settings poll interval (independent of `poll_interval`).
    pub settings_interval: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl MonitorConfig {
    /// Config with the portal defaults for everything but the account.
    pub fn new(
        username: impl Into<String>,
        password: SecretString,
        serial_number: impl Into<String>,
    ) -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            username: username.into(),
            password,
            serial_number: serial_number.into(),
            verify_tls: true,
            poll_interval: DEFAULT_POLL_INTERVAL,
            settings_interval: DEFAULT_SETTINGS_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
