use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use parcelis_carrier::CarrierApi;
use parcelis_core::model::ShipmentStatus;
use parcelis_core::repository::{RepoError, ShipmentRepository};

use crate::refresh::{apply_tracking_result, RefreshFailurePolicy};

const DEFAULT_INTERVAL: Duration = Duration::from_secs(2 * 60);
const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(10);
const PAGE_SIZE: i64 = 200;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub refreshed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Periodic sweep that refreshes tracking for every non-terminal shipment.
///
/// Runs on a fixed delay: the next run is scheduled only after the current
/// one fully completes, so sweeps never overlap. A failing carrier call for
/// one shipment never blocks the rest of the sweep.
pub struct ReconciliationJob {
    shipments: Arc<dyn ShipmentRepository>,
    carrier: Arc<dyn CarrierApi>,
    interval: Duration,
    initial_delay: Duration,
}

impl ReconciliationJob {
    pub fn new(shipments: Arc<dyn ShipmentRepository>, carrier: Arc<dyn CarrierApi>) -> Self {
        Self {
            shipments,
            carrier,
            interval: DEFAULT_INTERVAL,
            initial_delay: DEFAULT_INITIAL_DELAY,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run until the shutdown flag flips. An in-flight sweep always drains
    /// before the loop exits.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tokio::select! {
            _ = sleep(self.initial_delay) => {}
            _ = shutdown.changed() => {
                info!("reconciliation job stopped before first sweep");
                return;
            }
        }

        loop {
            match self.sweep().await {
                Ok(stats) => debug!(
                    refreshed = stats.refreshed,
                    skipped = stats.skipped,
                    failed = stats.failed,
                    "reconciliation sweep finished"
                ),
                Err(e) => warn!(error = %e, "reconciliation sweep aborted"),
            }

            tokio::select! {
                _ = sleep(self.interval) => {}
                _ = shutdown.changed() => {
                    info!("reconciliation job shutting down");
                    return;
                }
            }
        }
    }

    /// One pass over all non-terminal shipments.
    ///
    /// Shipments without a tracking number are skipped entirely; querying
    /// the carrier by order reference returns ambiguous history. Per-record
    /// failures are logged and only touch the timestamp, deliberately not
    /// flipping the record to ERROR so the next sweep retries it.
    pub async fn sweep(&self) -> Result<SweepStats, RepoError> {
        let mut stats = SweepStats::default();
        let mut offset = 0i64;

        loop {
            let page = self
                .shipments
                .list_unfinished(&ShipmentStatus::TERMINAL, PAGE_SIZE, offset)
                .await?;
            let page_len = page.len();
            if page_len == 0 {
                break;
            }

            // Records refreshed into a terminal status leave the filtered
            // set and stop occupying a position, so the offset only advances
            // past the rows that stayed non-terminal. Advancing by the full
            // page length would jump over the rows that shifted down.
            let mut still_open = 0i64;

            for mut record in page {
                let tracking = match record
                    .tracking_number
                    .clone()
                    .filter(|t| !t.trim().is_empty())
                {
                    Some(t) => t,
                    None => {
                        stats.skipped += 1;
                        still_open += 1;
                        continue;
                    }
                };

                let result = self.carrier.track(&tracking).await;
                match apply_tracking_result(
                    &mut record,
                    result,
                    RefreshFailurePolicy::LeaveUnchanged,
                ) {
                    Ok(()) => {
                        stats.refreshed += 1;
                        debug!(
                            tracking = %tracking,
                            status = record.status.as_str(),
                            "tracking synced"
                        );
                    }
                    Err(err) => {
                        stats.failed += 1;
                        warn!(
                            tracking = %tracking,
                            error = %err,
                            "tracking sync failed, will retry next sweep"
                        );
                    }
                }

                let went_terminal = record.status.is_terminal();
                if !went_terminal {
                    still_open += 1;
                }

                if let Err(e) = self.shipments.update(&record).await {
                    warn!(tracking = %tracking, error = %e, "persisting synced shipment failed");
                    if went_terminal {
                        // The stored row kept its old status and still
                        // occupies a position in the filtered set.
                        still_open += 1;
                    }
                }
            }

            if (page_len as i64) < PAGE_SIZE {
                break;
            }
            offset += still_open;
        }

        Ok(stats)
    }
}
