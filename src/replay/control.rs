use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Shared run/pause/stop flags of one session plus its progress cursor.
///
/// The session loop only observes these at step boundaries and while
/// paused; commands never interrupt a step in flight.
#[derive(Debug, Default)]
pub struct SessionControl {
    stop: CancellationToken,
    paused: AtomicBool,
    cursor: AtomicUsize,
}

impl SessionControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the session was running and unpaused
    pub fn pause(&self) -> bool {
        !self.is_stopped() && !self.paused.swap(true, Ordering::SeqCst)
    }

    /// Returns `true` if the session was paused
    pub fn resume(&self) -> bool {
        !self.is_stopped() && self.paused.swap(false, Ordering::SeqCst)
    }

    /// Returns `true` on the first call
    pub fn stop(&self) -> bool {
        if self.stop.is_cancelled() {
            return false;
        }
        self.stop.cancel();
        self.paused.store(false, Ordering::SeqCst);
        true
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Steps completed so far
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    pub(crate) fn advance(&self) -> usize {
        self.cursor.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Suspend while paused, checking every `poll`. Returns `false` once the
    /// session has been stopped.
    pub async fn wait_while_paused(&self, poll: Duration) -> bool {
        loop {
            if self.is_stopped() {
                return false;
            }
            if !self.is_paused() {
                return true;
            }
            tokio::select! {
                _ = self.stop.cancelled() => return false,
                _ = tokio::time::sleep(poll) => {}
            }
        }
    }
}
