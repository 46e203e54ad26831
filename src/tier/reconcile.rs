//! Copying the fast tier over the durable tier, on demand and on a timer.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use super::TierMode;
use crate::error::{MemoryError, Result};
use crate::memory::store::Store;
use crate::memory::types::now;

const PASS_POLL: Duration = Duration::from_millis(10);

/// Result of asking for a reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// The durable store now holds a copy of the fast store.
    Completed { records: usize },
    /// Nothing to do: there is no fast tier.
    SkippedDiskOnly,
    /// Another pass was already running.
    SkippedBusy,
}

/// The two stores behind a coordinator, shared with the reconciler thread.
pub(crate) struct Tiers {
    pub(crate) durable: Store,
    pub(crate) fast: Option<Store>,
    /// Held for the duration of a pass; at most one runs at a time.
    pub(super) pass: Mutex<()>,
    last_reconciled: Mutex<Option<DateTime<Utc>>>,
}

impl Tiers {
    pub(crate) fn new(durable: Store, fast: Option<Store>) -> Self {
        Self {
            durable,
            fast,
            pass: Mutex::new(()),
            last_reconciled: Mutex::new(None),
        }
    }

    pub(crate) fn mode(&self) -> TierMode {
        if self.fast.is_some() {
            TierMode::Mirrored
        } else {
            TierMode::DiskOnly
        }
    }

    /// The store serving reads and writes.
    pub(crate) fn authoritative(&self) -> &Store {
        self.fast.as_ref().unwrap_or(&self.durable)
    }

    pub(crate) fn last_reconciled(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(*self.last_reconciled.lock()?)
    }

    /// Overwrite the durable store with a snapshot of the fast store.
    ///
    /// With `wait` the call queues behind a pass already in progress;
    /// without it the call returns [`ReconcileOutcome::SkippedBusy`].
    pub(crate) fn reconcile(&self, wait: bool) -> Result<ReconcileOutcome> {
        let Some(fast) = &self.fast else {
            return Ok(ReconcileOutcome::SkippedDiskOnly);
        };

        let pass = if wait {
            self.pass.lock()?
        } else {
            match self.pass.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::WouldBlock) => return Ok(ReconcileOutcome::SkippedBusy),
                Err(TryLockError::Poisoned(_)) => return Err(MemoryError::LockPoisoned),
            }
        };
        self.run_pass(fast, pass)
    }

    /// Like [`reconcile`](Self::reconcile), but waits at most `timeout` for a
    /// pass already in progress. Gives up with
    /// [`ReconcileOutcome::SkippedBusy`] if it is still running.
    pub(crate) fn reconcile_within(&self, timeout: Duration) -> Result<ReconcileOutcome> {
        let Some(fast) = &self.fast else {
            return Ok(ReconcileOutcome::SkippedDiskOnly);
        };

        let deadline = Instant::now() + timeout;
        loop {
            match self.pass.try_lock() {
                Ok(pass) => return self.run_pass(fast, pass),
                Err(TryLockError::Poisoned(_)) => return Err(MemoryError::LockPoisoned),
                Err(TryLockError::WouldBlock) => {
                    let now = Instant::now();
                    if now >= deadline {
                        tracing::warn!(
                            timeout_secs = timeout.as_secs_f64(),
                            "reconciliation still in progress, skipping final pass"
                        );
                        return Ok(ReconcileOutcome::SkippedBusy);
                    }
                    std::thread::sleep(PASS_POLL.min(deadline - now));
                }
            }
        }
    }

    fn run_pass(&self, fast: &Store, _pass: MutexGuard<'_, ()>) -> Result<ReconcileOutcome> {
        let snapshot = fast
            .export()
            .map_err(|e| MemoryError::Reconciliation(format!("snapshot of fast tier: {e}")))?;
        self.durable
            .import(&snapshot)
            .map_err(|e| MemoryError::Reconciliation(format!("write to durable tier: {e}")))?;

        *self.last_reconciled.lock()? = Some(now());
        let records = snapshot.total();
        tracing::debug!(records, durable = %self.durable.path().display(), "reconciled");
        Ok(ReconcileOutcome::Completed { records })
    }
}

/// Background thread running [`Tiers::reconcile`] every `interval`.
///
/// Stops at the next wake-up after [`stop`](Self::stop) signals it. A failed
/// pass is logged and retried on the next tick.
pub(crate) struct Reconciler {
    stop_tx: mpsc::Sender<()>,
    done_rx: mpsc::Receiver<()>,
    handle: JoinHandle<()>,
}

impl Reconciler {
    pub(crate) fn spawn(tiers: Arc<Tiers>, interval: Duration) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let (done_tx, done_rx) = mpsc::channel::<()>();

        let handle = std::thread::Builder::new()
            .name("strata-reconciler".into())
            .spawn(move || {
                tracing::info!(interval_secs = interval.as_secs(), "reconciler started");
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => match tiers.reconcile(false) {
                            Ok(ReconcileOutcome::SkippedBusy) => {
                                tracing::debug!("reconciliation already running, skipping tick")
                            }
                            Ok(_) => {}
                            Err(e) => {
                                tracing::error!(error = %e, "scheduled reconciliation failed, will retry")
                            }
                        },
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                tracing::info!("reconciler stopped");
                let _ = done_tx.send(());
            })?;

        Ok(Self {
            stop_tx,
            done_rx,
            handle,
        })
    }

    /// Signal the thread and wait up to `timeout` for it to finish. Returns
    /// `false` if it did not, in which case the thread is left detached.
    pub(crate) fn stop(self, timeout: Duration) -> bool {
        let _ = self.stop_tx.send(());
        match self.done_rx.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if self.handle.join().is_err() {
                    tracing::warn!("reconciler thread panicked");
                }
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    timeout_secs = timeout.as_secs_f64(),
                    "reconciler did not stop in time, continuing shutdown"
                );
                false
            }
        }
    }
}
