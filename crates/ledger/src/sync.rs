//! Debounced save indicator.
//!
//! State machine: `idle → syncing → synced → idle`. Every trigger restarts the
//! cycle; at most one timer task is pending at any time. Each cycle carries a
//! generation number and only the current generation may move the status.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Process-wide sync status.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Idle,
    Syncing,
    Synced,
}

/// Delays driving the indicator.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SyncTimings {
    /// Time spent in `syncing` before flipping to `synced`.
    pub syncing: Duration,
    /// Time spent in `synced` before returning to `idle`.
    pub settle: Duration,
}

impl Default for SyncTimings {
    fn default() -> Self {
        Self {
            syncing: Duration::from_millis(1500),
            settle: Duration::from_millis(2000),
        }
    }
}

/// Owner of the sync status and its single cancellable timer.
#[derive(Debug)]
pub struct SyncIndicator {
    timings: SyncTimings,
    status: Arc<watch::Sender<SyncStatus>>,
    generation: Arc<AtomicU64>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

/// Move to `next` if `cycle` is still the current generation.
///
/// The check runs under the channel's write lock, so a superseded timer that
/// already woke cannot overwrite the newer cycle's `syncing`.
fn advance(status: &watch::Sender<SyncStatus>, generation: &AtomicU64, cycle: u64, next: SyncStatus) -> bool {
    status.send_if_modified(|current| {
        if generation.load(Ordering::SeqCst) != cycle {
            return false;
        }
        *current = next;
        true
    })
}

impl Default for SyncIndicator {
    fn default() -> Self {
        Self::new(SyncTimings::default())
    }
}

impl SyncIndicator {
    pub fn new(timings: SyncTimings) -> Self {
        let (tx, _rx) = watch::channel(SyncStatus::Idle);
        Self {
            timings,
            status: Arc::new(tx),
            generation: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
        }
    }

    pub fn status(&self) -> SyncStatus {
        *self.status.borrow()
    }

    /// Observe status changes.
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    /// Signal that state changed.
    ///
    /// Cancels any pending timer, sets `syncing`, and schedules the
    /// `synced` / `idle` transitions. Outside a Tokio runtime there is nothing
    /// to schedule on, so the status goes straight to `synced`.
    pub fn trigger(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = pending.take() {
            handle.abort();
        }

        let cycle = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.status.send_replace(SyncStatus::Syncing);

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let status = Arc::clone(&self.status);
                let generation = Arc::clone(&self.generation);
                let timings = self.timings;
                *pending = Some(runtime.spawn(async move {
                    tokio::time::sleep(timings.syncing).await;
                    if !advance(&status, &generation, cycle, SyncStatus::Synced) {
                        return;
                    }
                    tokio::time::sleep(timings.settle).await;
                    advance(&status, &generation, cycle, SyncStatus::Idle);
                }));
            }
            Err(_) => {
                tracing::debug!("no tokio runtime; sync indicator settles immediately");
                self.status.send_replace(SyncStatus::Synced);
            }
        }
    }

    pub fn has_pending_timer(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for SyncIndicator {
    fn drop(&mut self) {
        let pending = self.pending.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = pending.take() {
            handle.abort();
        }
    }
}
