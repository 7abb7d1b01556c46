//! Stress test framework for the bounded queue.
//!
//! Provides configurable high-contention runs with:
//! - Producer and consumer count control
//! - Per-producer item limits
//! - Time-based early stop
//! - Seeded scheduling jitter
//! - Loss, duplication and ordering checks on everything consumed

use core::time::Duration;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Instant;

use foundation_queue::{BoundedBlockingQueue, QueueConfig};

use crate::errors::ScenarioResult;
use crate::scenarios::{Pipeline, Producer};

pub mod config;

pub use config::StressConfig;

/// Item sent through the queue during a stress run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tagged {
    pub producer: usize,
    pub seq: usize,
}

impl Tagged {
    /// End-of-stream marker, never produced as a regular item.
    pub const POISON: Self = Self {
        producer: usize::MAX,
        seq: usize::MAX,
    };
}

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressResult {
    /// Items accepted by the queue
    pub produced: usize,
    /// Items taken by consumers, poison pills excluded
    pub consumed: usize,
    /// Extra copies of items that were consumed more than once
    pub duplicates: usize,
    /// Produced items that were never consumed
    pub missing: usize,
    /// Consumed items that no producer sent
    pub corrupted: usize,
    /// Times a consumer saw a producer's items out of send order
    pub order_violations: usize,
    /// Largest `size()` any thread observed
    pub max_observed_size: usize,
    /// Capacity of the queue under test
    pub capacity: usize,
    /// Total time taken for the run
    pub duration: Duration,
    pub producers: usize,
    pub consumers: usize,
}

impl StressResult {
    /// True when nothing was lost, duplicated, corrupted or reordered and
    /// the queue never reported more than its capacity.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.produced == self.consumed
            && self.duplicates == 0
            && self.missing == 0
            && self.corrupted == 0
            && self.order_violations == 0
            && self.max_observed_size <= self.capacity
    }

    /// Returns items moved through the queue per second.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn operations_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.consumed as f64 / secs
        }
    }
}

/// What one consumer took, in take order.
struct ConsumerLog {
    items: Vec<Tagged>,
    jitter: Option<fastrand::Rng>,
}

/// Randomly yields the thread, about one call in eight.
fn maybe_yield(rng: Option<&mut fastrand::Rng>) {
    if let Some(rng) = rng {
        if rng.u8(..8) == 0 {
            thread::yield_now();
        }
    }
}

fn jitter_rng(seed: Option<u64>, salt: u64) -> Option<fastrand::Rng> {
    seed.map(|seed| fastrand::Rng::with_seed(seed ^ salt.wrapping_mul(0x9E37_79B9_7F4A_7C15)))
}

/// Multi-producer / multi-consumer stress harness.
///
/// Each producer sends `Tagged { producer, seq }` items with `seq`
/// counting up from zero; consumers record everything they take. The
/// result reports any loss, duplication or per-producer reordering.
pub struct StressHarness {
    config: StressConfig,
}

impl StressHarness {
    /// Creates a new stress test harness with the given configuration.
    #[must_use]
    pub const fn new(config: StressConfig) -> Self {
        Self { config }
    }

    /// Runs the configured producers and consumers to completion.
    ///
    /// # Examples
    ///
    /// ```
    /// use foundation_testing::stress::{StressConfig, StressHarness};
    ///
    /// let config = StressConfig::new()
    ///     .producers(3)
    ///     .consumers(2)
    ///     .items_per_producer(200)
    ///     .capacity(4);
    ///
    /// let result = StressHarness::new(config).run().unwrap();
    ///
    /// assert_eq!(result.consumed, 600);
    /// assert!(result.is_clean());
    /// ```
    ///
    /// # Errors
    ///
    /// Queue construction errors (zero capacity), zero producers or
    /// consumers, or a panicked worker thread.
    #[allow(clippy::cast_possible_truncation)]
    pub fn run(self) -> ScenarioResult<StressResult> {
        let config = self.config;
        let queue = BoundedBlockingQueue::from_config(
            &QueueConfig::new(config.get_capacity()).name("stress"),
        )?;

        let start = Instant::now();
        let max_observed = Arc::new(AtomicUsize::new(0));

        let logs: Arc<Vec<Mutex<ConsumerLog>>> = Arc::new(
            (0..config.get_consumers())
                .map(|id| {
                    Mutex::new(ConsumerLog {
                        items: Vec::new(),
                        jitter: jitter_rng(config.get_seed(), (id as u64) << 32),
                    })
                })
                .collect(),
        );

        let produce = {
            let queue = queue.clone();
            let max_observed = Arc::clone(&max_observed);
            move |producer: &mut Producer<Tagged>| -> ScenarioResult<()> {
                let id = producer.id();
                let mut jitter = jitter_rng(config.get_seed(), id as u64);
                for seq in 0..config.get_items_per_producer() {
                    if config
                        .get_duration()
                        .is_some_and(|limit| start.elapsed() >= limit)
                    {
                        break;
                    }
                    maybe_yield(jitter.as_mut());
                    producer.send(Tagged { producer: id, seq })?;
                    max_observed.fetch_max(queue.size(), Ordering::Relaxed);
                }
                Ok(())
            }
        };

        let consume = {
            let queue = queue.clone();
            let logs = Arc::clone(&logs);
            let max_observed = Arc::clone(&max_observed);
            move |consumer: usize, item: Tagged| {
                max_observed.fetch_max(queue.size(), Ordering::Relaxed);
                let mut log = logs[consumer]
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                log.items.push(item);
                maybe_yield(log.jitter.as_mut());
            }
        };

        let report = Pipeline::new(queue, Tagged::POISON)
            .producers(config.get_producers())
            .consumers(config.get_consumers())
            .run(produce, consume)?;

        let duration = start.elapsed();

        let taken: Vec<Vec<Tagged>> = logs
            .iter()
            .map(|log| {
                core::mem::take(&mut log.lock().unwrap_or_else(PoisonError::into_inner).items)
            })
            .collect();

        let mut result = StressResult {
            produced: report.total_produced(),
            consumed: report.total_consumed(),
            duplicates: 0,
            missing: 0,
            corrupted: 0,
            order_violations: 0,
            max_observed_size: max_observed.load(Ordering::Relaxed),
            capacity: config.get_capacity(),
            duration,
            producers: config.get_producers(),
            consumers: config.get_consumers(),
        };
        tally(&report.produced, &taken, &mut result);

        tracing::debug!(
            produced = result.produced,
            consumed = result.consumed,
            clean = result.is_clean(),
            "stress run finished"
        );
        Ok(result)
    }
}

/// Fills the loss, duplication and ordering counters of `result`.
///
/// `sent[p]` is how many items producer `p` sent, so its sequence numbers
/// are exactly `0..sent[p]`.
fn tally(sent: &[usize], taken: &[Vec<Tagged>], result: &mut StressResult) {
    let mut seen: Vec<Vec<u32>> = sent.iter().map(|count| vec![0; *count]).collect();

    for log in taken {
        let mut last_seq: Vec<Option<usize>> = vec![None; sent.len()];
        for item in log {
            let Some(slot) = seen
                .get_mut(item.producer)
                .and_then(|counts| counts.get_mut(item.seq))
            else {
                result.corrupted += 1;
                continue;
            };
            *slot += 1;

            if let Some(previous) = last_seq[item.producer] {
                if item.seq <= previous {
                    result.order_violations += 1;
                }
            }
            last_seq[item.producer] = Some(item.seq);
        }
    }

    for counts in &seen {
        for count in counts {
            match *count {
                0 => result.missing += 1,
                1 => {}
                n => result.duplicates += (n - 1) as usize,
            }
        }
    }
}
