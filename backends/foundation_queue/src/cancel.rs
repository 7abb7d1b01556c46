//! Implements the cancellation signal checked by the blocking queue
//! operations at every suspension point.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Indicates the token was cancelled.
const SET: usize = 1;

/// Indicates the token was not cancelled.
const UNSET: usize = 0;

/// `Waker` is implemented by anything a thread can be blocked on, so
/// that cancelling a token can get the blocked thread moving again.
///
/// `wake` must make sure a waiter that already checked the token and is
/// about to suspend still observes the wake-up, usually by taking the
/// same lock the waiter suspends with.
pub(crate) trait Waker: Send + Sync {
    fn wake(&self);
}

/// Handle into the waker registry, generation marked so a stale handle
/// never removes a newer registration sharing the same slot.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub(crate) struct Entry {
    id: usize,
    gen: usize,
}

#[derive(Default)]
struct WakerList {
    items: Vec<(usize, Option<Arc<dyn Waker>>)>,
    free_entries: Vec<usize>,
}

impl WakerList {
    fn insert(&mut self, waker: Arc<dyn Waker>) -> Entry {
        if let Some(id) = self.free_entries.pop() {
            let slot = &mut self.items[id];
            slot.0 += 1;
            slot.1 = Some(waker);
            return Entry { id, gen: slot.0 };
        }

        self.items.push((0, Some(waker)));
        Entry {
            id: self.items.len() - 1,
            gen: 0,
        }
    }

    fn vacate(&mut self, entry: &Entry) {
        if let Some((gen, value)) = self.items.get_mut(entry.id) {
            if *gen == entry.gen && value.take().is_some() {
                self.free_entries.push(entry.id);
            }
        }
    }

    /// Empties every occupied slot, returning what was registered.
    fn take_all(&mut self) -> Vec<Arc<dyn Waker>> {
        let mut wakers = Vec::new();
        for (id, (_, value)) in self.items.iter_mut().enumerate() {
            if let Some(waker) = value.take() {
                wakers.push(waker);
                self.free_entries.push(id);
            }
        }
        wakers
    }

    fn active_slots(&self) -> usize {
        self.items.len() - self.free_entries.len()
    }
}

struct TokenInner {
    state: AtomicUsize,
    wakers: Mutex<WakerList>,
}

/// `CancellationToken` lets one thread abort the blocking waits of
/// others.
///
/// Clones share the same signal. Once cancelled a token stays cancelled;
/// make a new token for the next unit of work.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<TokenInner>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .field("waiters", &self.waiting())
            .finish()
    }
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TokenInner {
                state: AtomicUsize::new(UNSET),
                wakers: Mutex::new(WakerList::default()),
            }),
        }
    }

    /// `cancel` flips the token from UNSET to SET and wakes every waiter
    /// currently registered with it.
    ///
    /// Returns `false` if the token was already cancelled.
    pub fn cancel(&self) -> bool {
        if self
            .inner
            .state
            .compare_exchange(UNSET, SET, Ordering::SeqCst, Ordering::Relaxed)
            .is_err()
        {
            return false;
        }

        // The registry lock orders this snapshot against registrations: a
        // waiter registering after it is guaranteed to see SET.
        let wakers = self.list().take_all();
        tracing::debug!(waiters = wakers.len(), "CancellationToken cancelled");

        for waker in wakers {
            waker.wake();
        }
        true
    }

    /// `is_cancelled` returns true once [`Self::cancel`] was called on
    /// this token or any of its clones.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.state.load(Ordering::SeqCst) == SET
    }

    /// Number of waits currently registered with the token.
    #[must_use]
    pub fn waiting(&self) -> usize {
        self.list().active_slots()
    }

    pub(crate) fn register(&self, waker: Arc<dyn Waker>) -> Registration<'_> {
        let entry = self.list().insert(waker);
        Registration { token: self, entry }
    }

    fn list(&self) -> std::sync::MutexGuard<'_, WakerList> {
        self.inner
            .wakers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keeps a waker registered for as long as it lives.
pub(crate) struct Registration<'a> {
    token: &'a CancellationToken,
    entry: Entry,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.token.list().vacate(&self.entry);
    }
}
