// ── Monitor facade ──
//
// Lifecycle management around the Coordinator: build the client from
// config, run the fixed-interval poll task, publish snapshots and status
// over watch channels. Cheaply cloneable via Arc<MonitorInner>.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::coordinator::Coordinator;
use crate::error::CoreError;
use crate::snapshot::Snapshot;

/// Outcome of the most recent tick, observable by consumers.
///
/// Gates downstream use of the snapshot channel: a `Failed` status means
/// the latest published snapshot (if any) is stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    /// No tick has completed yet.
    Idle,
    /// The last tick published a snapshot.
    Ok,
    /// The last tick failed; the previous snapshot, if any, still stands.
    Failed { message: String },
}

/// The main entry point for consumers.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    coordinator: Mutex<Coordinator>,
    poll_interval: Duration,
    snapshot_tx: watch::Sender<Option<Arc<Snapshot>>>,
    status_tx: watch::Sender<UpdateStatus>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Monitor {
    /// Create a monitor from configuration. Does NOT poll yet -- call
    /// [`start()`](Self::start) to run the first tick and begin the loop.
    pub fn new(config: &MonitorConfig) -> Result<Self, CoreError> {
        let coordinator = Coordinator::from_config(config)?;
        let (snapshot_tx, _) = watch::channel(None);
        let (status_tx, _) = watch::channel(UpdateStatus::Idle);

        Ok(Self {
            inner: Arc::new(MonitorInner {
                coordinator: Mutex::new(coordinator),
                poll_interval: config.poll_interval,
                snapshot_tx,
                status_tx,
                cancel: CancellationToken::new(),
                task: Mutex::new(None),
            }),
        })
    }

    /// Subscribe to published snapshots. The receiver starts at `None`
    /// until the first successful tick.
    pub fn snapshots(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.inner.snapshot_tx.subscribe()
    }

    /// Subscribe to the per-tick status.
    pub fn status(&self) -> watch::Receiver<UpdateStatus> {
        self.inner.status_tx.subscribe()
    }

    /// Run the first tick, then spawn the background poll task.
    ///
    /// The first tick's failure is returned to the caller (bad credentials
    /// should fail loudly at startup); later tick failures only flip the
    /// status channel.
    pub async fn start(&self) -> Result<Arc<Snapshot>, CoreError> {
        let snapshot = self.refresh_now().await?;

        let mut task = self.inner.task.lock().await;
        if task.is_none() {
            let monitor = self.clone();
            let cancel = self.inner.cancel.clone();
            let interval = self.inner.poll_interval;
            *task = Some(tokio::spawn(poll_task(monitor, interval, cancel)));
            info!(interval_secs = interval.as_secs(), "poll task started");
        }
        Ok(snapshot)
    }

    /// Run one tick immediately and publish the result.
    ///
    /// Ticks serialize on the coordinator lock, so a manual refresh never
    /// overlaps a scheduled one.
    pub async fn refresh_now(&self) -> Result<Arc<Snapshot>, CoreError> {
        let mut coordinator = self.inner.coordinator.lock().await;
        let result = coordinator.refresh().await;
        drop(coordinator);

        match result {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                let _ = self.inner.snapshot_tx.send(Some(Arc::clone(&snapshot)));
                let _ = self.inner.status_tx.send(UpdateStatus::Ok);
                Ok(snapshot)
            }
            Err(err) => {
                let _ = self.inner.status_tx.send(UpdateStatus::Failed {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Refresh settings immediately, bypassing the interval gate.
    /// Failures are logged by the coordinator, never raised.
    pub async fn force_refresh_settings(&self) {
        self.inner
            .coordinator
            .lock()
            .await
            .force_refresh_settings()
            .await;
    }

    /// Write one holding register, then force-refresh settings so the new
    /// value is visible without waiting for the gate.
    pub async fn write_setting(
        &self,
        hold_param: &str,
        value_text: &str,
    ) -> Result<bool, CoreError> {
        let mut coordinator = self.inner.coordinator.lock().await;
        coordinator.ensure_logged_in().await?;
        let accepted = coordinator
            .client()
            .write_setting(hold_param, value_text)
            .await?;
        if accepted {
            coordinator.force_refresh_settings().await;
        }
        Ok(accepted)
    }

    /// Cancel the poll task and wait for it to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        if let Some(task) = self.inner.task.lock().await.take() {
            let _ = task.await;
        }
        debug!("monitor shut down");
    }
}

/// Periodically refresh until cancelled. The host guarantee that ticks
/// never overlap falls out of awaiting each refresh before the next tick.
async fn poll_task(monitor: Monitor, poll_interval: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(poll_interval);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(err) = monitor.refresh_now().await {
                    warn!(error = %err, "periodic refresh failed");
                }
            }
        }
    }
}
