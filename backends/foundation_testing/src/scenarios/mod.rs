//! Common producer/consumer scenarios built on the bounded queue.
//!
//! - Poison-pill pipelines with any number of producers and consumers
//! - Probes for checking that a call blocks and later unblocks

pub mod producer_consumer;
pub mod rendezvous;

pub use producer_consumer::{Pipeline, PipelineReport, Producer};
pub use rendezvous::{spawn_probe, Probe};
