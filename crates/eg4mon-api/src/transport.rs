// Transport configuration for the shared reqwest::Client.
//
// The EG4 cloud uses a cookie-based session, so the jar is always
// installed. The monitor portal presents a valid certificate, but some
// deployments sit behind interception proxies -- TLS verification is
// therefore toggleable.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};

use crate::error::Error;

/// Transport settings shared by every request of one client.
#[derive(Debug, Clone)]
pub struct Transport {
    /// Verify the server certificate. `false` maps to
    /// `danger_accept_invalid_certs`.
    pub verify_tls: bool,
    /// Per-request timeout. A timed-out fetch is indistinguishable from any
    /// other transport failure to callers.
    pub timeout: Duration,
}

impl Default for Transport {
    fn default() -> Self {
        Self {
            verify_tls: true,
            timeout: Duration::from_secs(30),
        }
    }
}

impl Transport {
    /// Build a `reqwest::Client` from this config.
    ///
    /// The fixed header pair the portal expects is installed as default
    /// headers; the cookie store holds the session cookie after login.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .cookie_store(true)
            .default_headers(headers)
            .user_agent(concat!("eg4mon/", env!("CARGO_PKG_VERSION")));

        if !self.verify_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder.build().map_err(Error::Transport)
    }
}
