//! Async client for the EG4 Electronics inverter cloud API
//! (`monitor.eg4electronics.com`).
//!
//! The API is a form-urlencoded-in / JSON-out surface behind a cookie-based
//! session. [`Eg4Client`] owns the session lifecycle: credential login,
//! inverter discovery and selection, telemetry fetches (runtime, energy,
//! battery), the six-window parameter read, and the single parameter write.
//!
//! Every authenticated request goes through one shared primitive that
//! performs exactly one implicit re-login-and-replay when the session cookie
//! is rejected with a 401. Server-side rejections of a well-formed request
//! (`success: false` in the body) are returned as data
//! ([`ApiResponse::Failure`]), not as errors -- callers decide how to degrade.

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::{Eg4Client, Selection};
pub use error::Error;
pub use models::{
    ApiResponse, BatteryData, BatteryUnit, Credentials, EnergyData, Inverter, InverterParameters,
    RuntimeData,
};
pub use transport::Transport;
