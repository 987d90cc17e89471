//! Continuous polling command handler.

use std::time::Duration;

use tracing::debug;

use eg4mon_core::{Monitor, MonitorConfig};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::status::summary_line;

pub async fn handle(
    mut config: MonitorConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Some(secs) = args.interval {
        config.poll_interval = Duration::from_secs(secs);
    }
    if args.count == Some(0) {
        return Ok(());
    }

    let monitor = Monitor::new(&config)?;
    let renderer = output::Renderer::from_opts(global);

    // First tick runs inline so startup failures reach the caller.
    // Subscribing afterwards marks that snapshot as seen, so the loop
    // only wakes for later ticks.
    let first = monitor.start().await?;
    let mut snapshots = monitor.snapshots();
    renderer.single(&*first, summary_line, summary_line);
    let mut printed: u64 = 1;

    let done = loop {
        if !within_limit(args.count, printed) {
            break Ok(());
        }
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                debug!("interrupt received, shutting down");
                break result.map_err(CliError::Io);
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if let Some(snap) = snapshot {
                    renderer.single(&*snap, summary_line, summary_line);
                    printed += 1;
                }
            }
        }
    };

    monitor.shutdown().await;
    done
}

/// True while another snapshot may still be printed under `limit`.
fn within_limit(limit: Option<u64>, printed: u64) -> bool {
    limit.is_none_or(|n| printed < n)
}

#[cfg(test)]
mod tests {
    use super::within_limit;

    #[test]
    fn zero_count_allows_no_snapshots() {
        assert!(!within_limit(Some(0), 0));
    }

    #[test]
    fn count_limits_snapshots_printed() {
        assert!(within_limit(Some(1), 0));
        assert!(!within_limit(Some(1), 1));
        assert!(within_limit(Some(3), 2));
        assert!(!within_limit(Some(3), 3));
    }

    #[test]
    fn no_count_never_stops() {
        assert!(within_limit(None, 0));
        assert!(within_limit(None, 10_000));
    }
}
