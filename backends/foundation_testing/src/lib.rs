//! Reusable stress testing infrastructure for the Foundation bounded queue.
//!
//! This crate provides:
//! - **Stress test framework**: Configurable high-contention producer/consumer runs
//! - **Common scenarios**: Poison-pill pipelines, blocking-call probes
//! - **Criterion benchmarks**: Throughput of the queue under contention
//!
//! # Examples
//!
//! ```rust
//! use foundation_testing::stress::{StressConfig, StressHarness};
//!
//! let config = StressConfig::new()
//!     .producers(4)
//!     .consumers(4)
//!     .items_per_producer(500)
//!     .capacity(8);
//!
//! let result = StressHarness::new(config).run().unwrap();
//!
//! assert_eq!(result.consumed, 2000); // 4 producers * 500 items
//! assert!(result.is_clean());
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)] // Common for testing crates

pub mod errors;
pub mod scenarios;
pub mod stress;

// Re-export commonly used items
pub use errors::{ScenarioError, ScenarioResult};
pub use stress::{StressConfig, StressHarness, StressResult};
