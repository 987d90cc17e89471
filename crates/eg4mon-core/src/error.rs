use thiserror::Error;

/// Errors surfaced by the coordinator and monitor.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Client-level failure (auth, transport, protocol) that escaped the
    /// cache-fallback path -- e.g. the lazy first login failed.
    #[error(transparent)]
    Api(#[from] eg4mon_api::Error),

    /// No usable data, cached or fresh, exists for a mandatory dataset.
    /// The tick is dropped; the next scheduled tick retries from scratch.
    #[error("update failed: {message}")]
    UpdateFailed { message: String },
}

impl CoreError {
    /// Returns `true` if resolving this error needs new credentials
    /// rather than a retry.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_auth())
    }
}
