use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::cancel::{CancellationToken, Waker};
use crate::config::QueueConfig;
use crate::errors::{Cancelled, OfferError, QueueError, QueueResult};
use crate::ring::Ring;

/// Label used in log records for queues built without a name.
const ANONYMOUS: &str = "anonymous";

/// Which end of the queue a caller is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    /// Waiting for a free slot.
    Insert,
    /// Waiting for an element.
    Remove,
}

impl Side {
    #[inline]
    fn ready<T>(self, ring: &Ring<T>) -> bool {
        match self {
            Side::Insert => !ring.is_full(),
            Side::Remove => !ring.is_empty(),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Side::Insert => "insert",
            Side::Remove => "remove",
        }
    }
}

/// How a wait ended. The guard is always handed back with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wait {
    Ready,
    TimedOut,
    Cancelled,
}

/// A token paired with the waker the queue registers with it while a
/// caller is suspended.
struct Canceller<'t> {
    token: &'t CancellationToken,
    waker: Arc<dyn Waker>,
}

impl Canceller<'_> {
    #[inline]
    fn cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

struct Inner<T> {
    ring: Mutex<Ring<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    /// Mirror of the ring's count, written under the lock and read
    /// without it by `size()`.
    count: AtomicUsize,
    capacity: usize,
    name: Option<String>,
}

impl<T: Send> Waker for Inner<T> {
    fn wake(&self) {
        // Taking the lock means every registered waiter is either already
        // suspended or has yet to check its token.
        let guard = self.lock();
        drop(guard);
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }
}

impl<T> Inner<T> {
    fn lock(&self) -> MutexGuard<'_, Ring<T>> {
        // Ring mutations never run caller code halfway through, so a
        // poisoned lock still guards a consistent ring.
        match self.ring.lock() {
            Ok(g) => g,
            Err(e) => e.into_inner(),
        }
    }

    fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(ANONYMOUS)
    }

    fn condvar(&self, side: Side) -> &Condvar {
        match side {
            Side::Insert => &self.not_full,
            Side::Remove => &self.not_empty,
        }
    }

    /// Suspends until `side` is ready, the deadline passes or the
    /// canceller fires, re-checking the predicate after every wake-up.
    ///
    /// Readiness is checked before the deadline and the token, so a wait
    /// that was notified never gives up its wake-up.
    fn wait_for<'a>(
        &'a self,
        mut guard: MutexGuard<'a, Ring<T>>,
        side: Side,
        deadline: Option<Instant>,
        cancel: Option<&Canceller<'_>>,
    ) -> (MutexGuard<'a, Ring<T>>, Wait) {
        if side.ready(&guard) {
            return (guard, Wait::Ready);
        }

        // Registered before the first token check below, so a concurrent
        // cancel either sees this waker or is seen by that check.
        let _registration = cancel.map(|c| c.token.register(Arc::clone(&c.waker)));

        tracing::trace!(
            queue = self.label(),
            side = side.as_str(),
            count = guard.len(),
            "suspending"
        );

        let condvar = self.condvar(side);
        loop {
            if side.ready(&guard) {
                tracing::trace!(queue = self.label(), side = side.as_str(), "resumed");
                return (guard, Wait::Ready);
            }

            if cancel.is_some_and(Canceller::cancelled) {
                tracing::debug!(queue = self.label(), side = side.as_str(), "wait cancelled");
                return (guard, Wait::Cancelled);
            }

            match deadline {
                None => {
                    guard = match condvar.wait(guard) {
                        Ok(g) => g,
                        Err(e) => e.into_inner(),
                    };
                }
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        tracing::debug!(queue = self.label(), side = side.as_str(), "wait timed out");
                        return (guard, Wait::TimedOut);
                    }

                    guard = match condvar.wait_timeout(guard, deadline - now) {
                        Ok((g, _)) => g,
                        Err(e) => e.into_inner().0,
                    };
                }
            }
        }
    }

    /// Writes `item` at the tail and wakes one consumer.
    fn insert(&self, mut guard: MutexGuard<'_, Ring<T>>, item: T) -> Result<(), T> {
        guard.push(item)?;
        self.count.store(guard.len(), Ordering::Release);
        drop(guard);

        self.not_empty.notify_one();
        Ok(())
    }

    /// Removes the head element and wakes one producer.
    fn remove(&self, mut guard: MutexGuard<'_, Ring<T>>) -> Option<T> {
        let item = guard.pop()?;
        self.count.store(guard.len(), Ordering::Release);
        drop(guard);

        self.not_full.notify_one();
        Some(item)
    }
}

/// A fixed-capacity, thread-safe FIFO queue with blocking, timed and
/// cancellable insertion and removal.
///
/// Handles are cheap to clone and all clones share the same queue.
///
/// # Examples
///
/// ```
/// use foundation_queue::BoundedBlockingQueue;
/// use std::thread;
///
/// let queue = BoundedBlockingQueue::new(2).unwrap();
///
/// let producer = {
///     let queue = queue.clone();
///     thread::spawn(move || {
///         for i in 0..5 {
///             queue.put(i);
///         }
///     })
/// };
///
/// let taken: Vec<i32> = (0..5).map(|_| queue.take()).collect();
/// producer.join().unwrap();
///
/// assert_eq!(taken, vec![0, 1, 2, 3, 4]);
/// ```
pub struct BoundedBlockingQueue<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for BoundedBlockingQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> core::fmt::Debug for BoundedBlockingQueue<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BoundedBlockingQueue")
            .field("name", &self.inner.label())
            .field("capacity", &self.inner.capacity)
            .field("size", &self.size())
            .finish()
    }
}

// --- constructors

impl<T> BoundedBlockingQueue<T> {
    /// Creates a queue holding at most `capacity` elements.
    ///
    /// # Errors
    ///
    /// [`QueueError::InvalidArgument`] if `capacity` is zero.
    pub fn new(capacity: usize) -> QueueResult<Self> {
        Self::from_config(&QueueConfig::new(capacity))
    }

    /// Creates a queue from a validated [`QueueConfig`].
    ///
    /// # Errors
    ///
    /// [`QueueError::InvalidArgument`] if the configuration is invalid.
    pub fn from_config(config: &QueueConfig) -> QueueResult<Self> {
        config.validate()?;

        let capacity = config.get_capacity();
        let inner = Inner {
            ring: Mutex::new(Ring::with_capacity(capacity)),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            count: AtomicUsize::new(0),
            capacity,
            name: config.get_name().map(String::from),
        };
        tracing::debug!(queue = inner.label(), capacity, "created bounded queue");

        Ok(Self {
            inner: Arc::new(inner),
        })
    }
}

// --- blocking and timed operations

impl<T> BoundedBlockingQueue<T> {
    /// Inserts `item` at the tail, blocking while the queue is full.
    pub fn put(&self, item: T) {
        let mut item = item;
        loop {
            // Without a deadline or token the wait only ends ready, so
            // this completes on the first pass.
            match self.offer_until(item, None, None) {
                Ok(()) => return,
                Err(err) => item = err.into_inner(),
            }
        }
    }

    /// Removes the head element, blocking while the queue is empty.
    pub fn take(&self) -> T {
        loop {
            if let Ok(Some(item)) = self.poll_until(None, None) {
                return item;
            }
        }
    }

    /// Inserts `item`, waiting at most `timeout` for a free slot.
    ///
    /// # Errors
    ///
    /// Hands `item` back untouched if the queue stayed full for the whole
    /// timeout. A zero timeout never blocks.
    pub fn offer(&self, item: T, timeout: Duration) -> Result<(), T> {
        self.offer_until(item, deadline_after(timeout), None)
            .map_err(OfferError::into_inner)
    }

    /// Removes the head element, waiting at most `timeout` for one.
    ///
    /// Returns `None` if the queue stayed empty for the whole timeout. A
    /// zero timeout never blocks.
    pub fn poll(&self, timeout: Duration) -> Option<T> {
        self.poll_until(deadline_after(timeout), None)
            .ok()
            .flatten()
    }

    /// Inserts `item` only if a slot is free right now.
    ///
    /// # Errors
    ///
    /// Hands `item` back if the queue is full.
    pub fn try_offer(&self, item: T) -> Result<(), T> {
        self.offer(item, Duration::ZERO)
    }

    /// Removes the head element only if one is available right now.
    pub fn try_poll(&self) -> Option<T> {
        self.poll(Duration::ZERO)
    }

    fn offer_until(
        &self,
        item: T,
        deadline: Option<Instant>,
        cancel: Option<&Canceller<'_>>,
    ) -> Result<(), OfferError<T>> {
        if cancel.is_some_and(Canceller::cancelled) {
            return Err(OfferError::Cancelled(item));
        }

        let guard = self.inner.lock();
        let (guard, outcome) = self.inner.wait_for(guard, Side::Insert, deadline, cancel);
        match outcome {
            Wait::Ready => self.inner.insert(guard, item).map_err(OfferError::Full),
            Wait::TimedOut => Err(OfferError::Full(item)),
            Wait::Cancelled => Err(OfferError::Cancelled(item)),
        }
    }

    fn poll_until(
        &self,
        deadline: Option<Instant>,
        cancel: Option<&Canceller<'_>>,
    ) -> QueueResult<Option<T>> {
        if cancel.is_some_and(Canceller::cancelled) {
            return Err(QueueError::Cancelled);
        }

        let guard = self.inner.lock();
        let (guard, outcome) = self.inner.wait_for(guard, Side::Remove, deadline, cancel);
        match outcome {
            Wait::Ready => Ok(self.inner.remove(guard)),
            Wait::TimedOut => Ok(None),
            Wait::Cancelled => Err(QueueError::Cancelled),
        }
    }
}

// --- cancellable operations

impl<T: Send + 'static> BoundedBlockingQueue<T> {
    fn canceller<'t>(&self, token: &'t CancellationToken) -> Canceller<'t> {
        let waker: Arc<dyn Waker> = self.inner.clone();
        Canceller { token, waker }
    }

    /// Like [`Self::put`], but gives up when `token` is cancelled.
    ///
    /// An already cancelled token fails without touching the queue. If a
    /// slot frees up before the cancellation is observed the insert goes
    /// through.
    ///
    /// # Errors
    ///
    /// [`Cancelled`] carrying `item` back.
    pub fn put_cancellable(&self, item: T, token: &CancellationToken) -> Result<(), Cancelled<T>> {
        let canceller = self.canceller(token);
        let mut item = item;
        loop {
            match self.offer_until(item, None, Some(&canceller)) {
                Ok(()) => return Ok(()),
                Err(OfferError::Cancelled(back)) => return Err(Cancelled(back)),
                Err(OfferError::Full(back)) => item = back,
            }
        }
    }

    /// Like [`Self::take`], but gives up when `token` is cancelled.
    ///
    /// # Errors
    ///
    /// [`QueueError::Cancelled`] if the wait was aborted.
    pub fn take_cancellable(&self, token: &CancellationToken) -> QueueResult<T> {
        let canceller = self.canceller(token);
        loop {
            if let Some(item) = self.poll_until(None, Some(&canceller))? {
                return Ok(item);
            }
        }
    }

    /// Like [`Self::offer`], but also gives up when `token` is cancelled.
    ///
    /// # Errors
    ///
    /// [`OfferError::Full`] on timeout, [`OfferError::Cancelled`] on
    /// cancellation, both carrying `item` back.
    pub fn offer_cancellable(
        &self,
        item: T,
        timeout: Duration,
        token: &CancellationToken,
    ) -> Result<(), OfferError<T>> {
        let canceller = self.canceller(token);
        self.offer_until(item, deadline_after(timeout), Some(&canceller))
    }

    /// Like [`Self::poll`], but also gives up when `token` is cancelled.
    ///
    /// # Errors
    ///
    /// [`QueueError::Cancelled`] if the wait was aborted. A timeout is
    /// `Ok(None)`.
    pub fn poll_cancellable(
        &self,
        timeout: Duration,
        token: &CancellationToken,
    ) -> QueueResult<Option<T>> {
        let canceller = self.canceller(token);
        self.poll_until(deadline_after(timeout), Some(&canceller))
    }
}

// --- inspection and bulk operations

impl<T> BoundedBlockingQueue<T> {
    /// Point-in-time element count, read without taking the lock. It may
    /// be stale as soon as it returns.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.inner.count.load(Ordering::Acquire)
    }

    /// Same as [`Self::size`].
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.size()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.size() == self.inner.capacity
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Free slots at this instant.
    #[inline]
    #[must_use]
    pub fn remaining_capacity(&self) -> usize {
        self.inner.capacity - self.size()
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Runs `f` on the head element without removing it. `f` runs under
    /// the queue lock, keep it short.
    pub fn peek_with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let guard = self.inner.lock();
        guard.front().map(f)
    }

    /// Moves up to `max` elements into `out` in FIFO order within one
    /// critical section, returning how many were moved.
    pub fn drain_into(&self, out: &mut Vec<T>, max: usize) -> usize {
        let mut guard = self.inner.lock();
        let mut moved = 0;
        while moved < max {
            let Some(item) = guard.pop() else {
                break;
            };
            out.push(item);
            moved += 1;
        }
        self.inner.count.store(guard.len(), Ordering::Release);
        drop(guard);

        match moved {
            0 => {}
            1 => self.inner.not_full.notify_one(),
            _ => self.inner.not_full.notify_all(),
        }
        moved
    }

    /// Drops every stored element, returning how many were dropped.
    pub fn clear(&self) -> usize {
        let mut guard = self.inner.lock();
        let dropped = guard.clear();
        self.inner.count.store(0, Ordering::Release);
        drop(guard);

        if dropped > 0 {
            self.inner.not_full.notify_all();
        }
        dropped
    }
}

/// A deadline too far out to represent means waiting without one.
fn deadline_after(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}
