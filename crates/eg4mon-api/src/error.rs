use thiserror::Error;

/// Top-level error type for the `eg4mon-api` crate.
///
/// The taxonomy callers care about is authentication versus everything else:
/// an [`Authentication`](Error::Authentication) failure means the credentials
/// are bad and a prompt for new ones is in order, while the remaining
/// variants are transport, protocol, or selection failures that may be
/// transient.
#[derive(Debug, Error)]
pub enum Error {
    /// Login failed (wrong credentials, account locked, rejected session).
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    /// HTTP transport error (connection refused, DNS failure, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Protocol-level failure: unexpected HTTP status, inverter selection
    /// error, empty device directory.
    #[error("API error: {message}")]
    Api { message: String },

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error means the credentials were rejected
    /// and re-authentication with new ones might resolve it.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient transport error worth
    /// waiting out until the next poll.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}
