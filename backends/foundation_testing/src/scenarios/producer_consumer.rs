//! Producer-consumer pipeline over a [`BoundedBlockingQueue`], shut down
//! with a caller-chosen poison pill.

use foundation_queue::{BoundedBlockingQueue, QueueError};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::errors::{ScenarioError, ScenarioResult};

type Panic = Box<dyn Any + Send>;

/// Producer side handle given to each producer closure.
///
/// Refuses the poison value, so only the pipeline itself can end the
/// stream.
pub struct Producer<T> {
    id: usize,
    queue: BoundedBlockingQueue<T>,
    poison: Arc<T>,
    sent: usize,
}

impl<T: PartialEq> Producer<T> {
    /// Index of this producer (`0..producers`).
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Items sent so far.
    #[must_use]
    pub fn sent(&self) -> usize {
        self.sent
    }

    /// Puts `item` on the queue, blocking while it is full.
    ///
    /// # Errors
    ///
    /// [`QueueError::InvalidArgument`] if `item` is the poison value.
    pub fn send(&mut self, item: T) -> ScenarioResult<()> {
        if item == *self.poison {
            return Err(QueueError::InvalidArgument("poison pill sent as a regular item").into());
        }
        self.queue.put(item);
        self.sent += 1;
        Ok(())
    }
}

/// Outcome of a [`Pipeline::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    /// Items sent, indexed by producer
    pub produced: Vec<usize>,
    /// Items handled, indexed by consumer
    pub consumed: Vec<usize>,
}

impl PipelineReport {
    #[must_use]
    pub fn total_produced(&self) -> usize {
        self.produced.iter().sum()
    }

    #[must_use]
    pub fn total_consumed(&self) -> usize {
        self.consumed.iter().sum()
    }
}

/// Runs producers and consumers joined by one queue.
///
/// Consumers stop when they take the poison value. Once every producer
/// has returned, the pipeline puts one poison value per consumer, so the
/// queue itself never needs a close operation.
///
/// # Examples
///
/// ```
/// use foundation_queue::BoundedBlockingQueue;
/// use foundation_testing::scenarios::Pipeline;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let queue = BoundedBlockingQueue::new(4).unwrap();
/// let total = Arc::new(AtomicUsize::new(0));
///
/// let sum = Arc::clone(&total);
/// let report = Pipeline::new(queue, -1_i64)
///     .producers(2)
///     .consumers(3)
///     .run(
///         |producer| {
///             for i in 0..10 {
///                 producer.send(i)?;
///             }
///             Ok(())
///         },
///         move |_consumer, item| {
///             sum.fetch_add(item as usize, Ordering::Relaxed);
///         },
///     )
///     .unwrap();
///
/// assert_eq!(report.total_produced(), 20);
/// assert_eq!(report.total_consumed(), 20);
/// assert_eq!(total.load(Ordering::Relaxed), 90);
/// ```
pub struct Pipeline<T> {
    queue: BoundedBlockingQueue<T>,
    poison: Arc<T>,
    producers: usize,
    consumers: usize,
}

impl<T> Pipeline<T>
where
    T: PartialEq + Clone + Send + Sync + 'static,
{
    /// Creates a pipeline with one producer and one consumer.
    #[must_use]
    pub fn new(queue: BoundedBlockingQueue<T>, poison: T) -> Self {
        Self {
            queue,
            poison: Arc::new(poison),
            producers: 1,
            consumers: 1,
        }
    }

    /// Sets the number of producer threads.
    #[must_use]
    pub fn producers(mut self, count: usize) -> Self {
        self.producers = count;
        self
    }

    /// Sets the number of consumer threads.
    #[must_use]
    pub fn consumers(mut self, count: usize) -> Self {
        self.consumers = count;
        self
    }

    /// Runs `produce` once on every producer thread and `consume` for every
    /// item taken, then shuts the consumers down with the poison value.
    ///
    /// # Errors
    ///
    /// [`QueueError::InvalidArgument`] when either side has zero threads,
    /// the first producer error, or [`ScenarioError::Paniced`] if a producer
    /// thread or a `consume` call panicked. Consumers are always shut down
    /// before returning.
    pub fn run<P, C>(self, produce: P, consume: C) -> ScenarioResult<PipelineReport>
    where
        P: Fn(&mut Producer<T>) -> ScenarioResult<()> + Send + Sync + 'static,
        C: Fn(usize, T) + Send + Sync + 'static,
    {
        if self.producers == 0 || self.consumers == 0 {
            return Err(QueueError::InvalidArgument("pipeline needs producers and consumers").into());
        }

        let produce = Arc::new(produce);
        let consume = Arc::new(consume);

        // A consumer whose `consume` panics keeps draining until its pill,
        // so producers and the pill loop below never block on a full queue.
        let consumer_handles: Vec<JoinHandle<(usize, Option<Panic>)>> = (0..self.consumers)
            .map(|id| {
                let queue = self.queue.clone();
                let poison = Arc::clone(&self.poison);
                let consume = Arc::clone(&consume);
                thread::spawn(move || {
                    let mut handled = 0;
                    let mut panicked: Option<Panic> = None;
                    loop {
                        let item = queue.take();
                        if item == *poison {
                            tracing::trace!(consumer = id, handled, "consumer took poison pill");
                            return (handled, panicked);
                        }
                        let outcome = panic::catch_unwind(AssertUnwindSafe(|| consume(id, item)));
                        if let Err(panic) = outcome {
                            tracing::debug!(consumer = id, "consume panicked, draining until pill");
                            panicked.get_or_insert(panic);
                        }
                        handled += 1;
                    }
                })
            })
            .collect();

        let producer_handles: Vec<JoinHandle<(usize, ScenarioResult<()>)>> = (0..self.producers)
            .map(|id| {
                let mut producer = Producer {
                    id,
                    queue: self.queue.clone(),
                    poison: Arc::clone(&self.poison),
                    sent: 0,
                };
                let produce = Arc::clone(&produce);
                thread::spawn(move || {
                    let result = produce(&mut producer);
                    (producer.sent, result)
                })
            })
            .collect();

        let mut failure: Option<ScenarioError> = None;
        let mut produced = Vec::with_capacity(self.producers);
        for handle in producer_handles {
            match handle.join() {
                Ok((sent, result)) => {
                    produced.push(sent);
                    if let Err(err) = result {
                        failure.get_or_insert(err);
                    }
                }
                Err(panic) => {
                    produced.push(0);
                    failure.get_or_insert(ScenarioError::Paniced(panic));
                }
            }
        }

        tracing::debug!(
            producers = self.producers,
            consumers = self.consumers,
            "producers finished, sending poison pills"
        );
        for _ in 0..self.consumers {
            self.queue.put((*self.poison).clone());
        }

        let mut consumed = Vec::with_capacity(self.consumers);
        for handle in consumer_handles {
            match handle.join() {
                Ok((handled, None)) => consumed.push(handled),
                Ok((handled, Some(panic))) => {
                    consumed.push(handled);
                    failure.get_or_insert(ScenarioError::Paniced(panic));
                }
                Err(panic) => {
                    consumed.push(0);
                    failure.get_or_insert(ScenarioError::Paniced(panic));
                }
            }
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(PipelineReport { produced, consumed }),
        }
    }
}
