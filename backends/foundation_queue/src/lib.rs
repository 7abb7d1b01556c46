//! Bounded blocking queue for multi-producer / multi-consumer hand-off
//! between threads.
//!
//! [`BoundedBlockingQueue`] is a fixed-capacity ring buffer guarded by one
//! mutex and two condition variables ("not full", "not empty"). It offers:
//! - blocking `put` / `take`
//! - timed `offer` / `poll`
//! - cancellable variants driven by a [`CancellationToken`]
//!
//! The queue has no close operation. Producers and consumers that need an
//! end-of-stream signal agree on their own poison value.
//!
//! # Examples
//!
//! ```
//! use foundation_queue::{BoundedBlockingQueue, CancellationToken, QueueError};
//! use std::thread;
//! use std::time::Duration;
//!
//! let queue: BoundedBlockingQueue<u32> = BoundedBlockingQueue::new(4).unwrap();
//! let token = CancellationToken::new();
//!
//! let consumer = {
//!     let queue = queue.clone();
//!     let token = token.clone();
//!     thread::spawn(move || queue.take_cancellable(&token))
//! };
//!
//! thread::sleep(Duration::from_millis(10));
//! token.cancel();
//!
//! assert!(matches!(consumer.join().unwrap(), Err(QueueError::Cancelled)));
//! assert_eq!(queue.poll(Duration::ZERO), None);
//! ```

mod cancel;
mod config;
mod errors;
mod queue;
mod ring;

pub use cancel::CancellationToken;
pub use config::QueueConfig;
pub use errors::{Cancelled, OfferError, QueueError, QueueResult};
pub use queue::BoundedBlockingQueue;
