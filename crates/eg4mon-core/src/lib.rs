//! Refresh coordination between [`eg4mon_api`] and downstream consumers.
//!
//! This crate owns the polling state machine for the EG4 cloud monitor:
//!
//! - **[`Coordinator`]** — One tick of synchronization: lazy first login,
//!   the three telemetry fetches with per-dataset cache fallback, the
//!   interval-gated settings read, and assembly of the combined
//!   [`Snapshot`]. Degradation is per dataset -- a failed fetch falls back
//!   to the last good value instead of collapsing the whole tick.
//!
//! - **[`Monitor`]** — Facade managing the lifecycle: builds the client
//!   from a [`MonitorConfig`], runs the fixed-interval poll task, and
//!   publishes snapshots and an [`UpdateStatus`] to subscribers over
//!   `tokio::sync::watch` channels.
//!
//! The energy dataset is mandatory: a tick without live or cached energy
//! data fails with [`CoreError::UpdateFailed`]. Runtime, battery, and
//! settings degrade to `None` instead -- see the field types on
//! [`Snapshot`].

pub mod config;
pub mod coordinator;
pub mod error;
pub mod monitor;
pub mod snapshot;

pub use config::MonitorConfig;
pub use coordinator::Coordinator;
pub use error::CoreError;
pub use monitor::{Monitor, UpdateStatus};
pub use snapshot::Snapshot;
