//! Background poller — runs an audit on every tick until shut down.
//!
//! Runs never overlap: each tick awaits the previous audit. A failed run is
//! logged and retried on the next tick. Shutdown only interrupts the wait
//! between ticks; a run that has started always completes.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::audit::{AuditOutcome, Auditor};

/// Handle to a running poller.
pub struct Poller {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

/// Spawn a background task that audits the mailbox every `interval`.
pub fn spawn_audit_poller(auditor: Arc<Auditor>, interval: Duration) -> Poller {
    let (shutdown, mut stop) = watch::channel(false);

    let handle = tokio::spawn(async move {
        info!("Audit poller started, polling every {}s", interval.as_secs());

        let mut tick = tokio::time::interval(interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tick.tick() => {}
                // Err means every sender is gone; treat it as a stop.
                _ = stop.changed() => {}
            }

            if *stop.borrow() || stop.has_changed().is_err() {
                info!("Audit poller shutting down");
                return;
            }

            poll_once(&auditor).await;
        }
    });

    Poller { handle, shutdown }
}

impl Poller {
    /// Signal shutdown and wait for the poller to exit.
    ///
    /// A run in progress is allowed to finish within `grace`; after that the
    /// task is aborted. Returns `false` if it had to be aborted.
    pub async fn stop(mut self, grace: Duration) -> bool {
        let _ = self.shutdown.send(true);

        match tokio::time::timeout(grace, &mut self.handle).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                error!("Audit poller task failed: {e}");
                true
            }
            Err(_) => {
                warn!(
                    grace_secs = grace.as_secs(),
                    "Audit still running after grace period, aborting"
                );
                self.handle.abort();
                false
            }
        }
    }
}

/// Run a single audit and log its outcome.
async fn poll_once(auditor: &Auditor) {
    match auditor.run_once().await {
        Ok(outcome) => log_outcome(&outcome),
        Err(e) => error!("Audit run failed: {e}"),
    }
}

/// One log line per outcome.
pub fn log_outcome(outcome: &AuditOutcome) {
    match outcome {
        AuditOutcome::NoDelivery => info!("No delivery to audit"),
        AuditOutcome::AlreadyProcessed { key } => info!(key = %key, "Nothing new"),
        AuditOutcome::Approved { key } => info!(key = %key, "Delivery approved"),
        AuditOutcome::Rejected {
            key,
            report,
            issues,
        } => info!(
            key = %key,
            issues,
            report = %report.display(),
            "Delivery rejected, report written"
        ),
    }
}
