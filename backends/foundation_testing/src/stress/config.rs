//! Stress test configuration.

use core::time::Duration;

/// Configuration for queue stress runs.
#[derive(Debug, Clone, Copy)]
pub struct StressConfig {
    /// Number of producer threads
    producers: usize,
    /// Number of consumer threads
    consumers: usize,
    /// Items each producer tries to send
    items_per_producer: usize,
    /// Capacity of the queue under test
    capacity: usize,
    /// Optional limit after which producers stop early
    duration: Option<Duration>,
    /// Seed for scheduling jitter, `None` runs without jitter
    seed: Option<u64>,
}

impl StressConfig {
    /// Creates a new stress configuration with default values.
    ///
    /// Defaults:
    /// - `producers`: 4
    /// - `consumers`: 4
    /// - `items_per_producer`: 1000
    /// - `capacity`: 16
    /// - `duration`: None (no time limit)
    /// - `seed`: None (no jitter)
    #[must_use]
    pub const fn new() -> Self {
        Self {
            producers: 4,
            consumers: 4,
            items_per_producer: 1000,
            capacity: 16,
            duration: None,
            seed: None,
        }
    }

    /// Sets the number of producer threads.
    #[must_use]
    pub const fn producers(mut self, count: usize) -> Self {
        self.producers = count;
        self
    }

    /// Sets the number of consumer threads.
    #[must_use]
    pub const fn consumers(mut self, count: usize) -> Self {
        self.consumers = count;
        self
    }

    /// Sets how many items each producer sends.
    #[must_use]
    pub const fn items_per_producer(mut self, count: usize) -> Self {
        self.items_per_producer = count;
        self
    }

    /// Sets the queue capacity.
    #[must_use]
    pub const fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the maximum duration for the run.
    ///
    /// If the duration is reached, producers stop early and the run
    /// drains what was already sent.
    #[must_use]
    pub const fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Enables seeded jitter: threads randomly yield between operations
    /// to shake out different interleavings. Same seed, same decisions.
    #[must_use]
    pub const fn jitter(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub const fn get_producers(&self) -> usize {
        self.producers
    }

    #[must_use]
    pub const fn get_consumers(&self) -> usize {
        self.consumers
    }

    #[must_use]
    pub const fn get_items_per_producer(&self) -> usize {
        self.items_per_producer
    }

    #[must_use]
    pub const fn get_capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub const fn get_duration(&self) -> Option<Duration> {
        self.duration
    }

    #[must_use]
    pub const fn get_seed(&self) -> Option<u64> {
        self.seed
    }

    /// Items sent if no duration limit cuts the run short.
    #[must_use]
    pub const fn planned_items(&self) -> usize {
        self.producers * self.items_per_producer
    }
}

impl Default for StressConfig {
    fn default() -> Self {
        Self::new()
    }
}
