//! Helpers for asserting that a call blocks, and that it unblocks.

use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::errors::{ScenarioError, ScenarioResult};

/// How often `join_within` checks on the probed thread.
const PROBE_INTERVAL: Duration = Duration::from_millis(1);

/// A call running on its own thread, started by [`spawn_probe`].
pub struct Probe<R> {
    handle: JoinHandle<R>,
    started: Receiver<()>,
}

/// Runs `call` on a new thread so the caller can check whether it is
/// still blocked.
///
/// # Examples
///
/// ```
/// use foundation_queue::BoundedBlockingQueue;
/// use foundation_testing::scenarios::spawn_probe;
/// use std::time::Duration;
///
/// let queue = BoundedBlockingQueue::new(1).unwrap();
/// let probe = {
///     let queue = queue.clone();
///     spawn_probe(move || queue.take())
/// };
///
/// assert!(probe.is_blocked_after(Duration::from_millis(20)));
/// queue.put(7);
/// assert_eq!(probe.join_within(Duration::from_secs(1)).unwrap(), 7);
/// ```
pub fn spawn_probe<R, F>(call: F) -> Probe<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let (started_tx, started) = mpsc::channel();
    let handle = thread::spawn(move || {
        // The receiver may already be gone if the prober lost interest.
        let _ = started_tx.send(());
        drop(started_tx);
        call()
    });
    Probe { handle, started }
}

impl<R> Probe<R> {
    /// Waits for the call to start, then for `grace`, and reports whether
    /// it has still not returned. Can be asked repeatedly.
    #[must_use]
    pub fn is_blocked_after(&self, grace: Duration) -> bool {
        // Disconnected means the start signal was already consumed.
        let _ = self.started.recv();
        thread::sleep(grace);
        !self.handle.is_finished()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Joins the call, giving up once `limit` elapses.
    ///
    /// # Errors
    ///
    /// [`ScenarioError::TimedOut`] if the call is still running after
    /// `limit`, [`ScenarioError::Paniced`] if it panicked.
    pub fn join_within(self, limit: Duration) -> ScenarioResult<R> {
        let deadline = Instant::now() + limit;
        while !self.handle.is_finished() {
            if Instant::now() >= deadline {
                return Err(ScenarioError::TimedOut(limit));
            }
            thread::sleep(PROBE_INTERVAL);
        }
        self.handle.join().map_err(ScenarioError::Paniced)
    }
}
