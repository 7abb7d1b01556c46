//! Queue construction configuration.

use serde::{Deserialize, Serialize};

use crate::errors::{QueueError, QueueResult};

/// Configuration for a [`crate::BoundedBlockingQueue`].
///
/// Can be built in code or read from a TOML table:
///
/// ```
/// use foundation_queue::QueueConfig;
///
/// let config = QueueConfig::from_toml_str(r#"
///     capacity = 10
///     name = "ingest"
/// "#).unwrap();
///
/// assert_eq!(config.get_capacity(), 10);
/// assert_eq!(config.get_name(), Some("ingest"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum number of elements held at once
    capacity: usize,
    /// Label attached to the queue's log records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl QueueConfig {
    /// Creates a configuration for a queue holding at most `capacity`
    /// elements. Validation happens in [`Self::validate`].
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            name: None,
        }
    }

    /// Sets the capacity.
    #[must_use]
    pub const fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the label used in log records.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub const fn get_capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn get_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Parses and validates a TOML table.
    ///
    /// # Errors
    ///
    /// [`QueueError::Config`] if the text does not parse,
    /// [`QueueError::InvalidArgument`] if it parses but is not usable.
    pub fn from_toml_str(text: &str) -> QueueResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration describes a usable queue.
    ///
    /// # Errors
    ///
    /// [`QueueError::InvalidArgument`] when the capacity is zero.
    pub fn validate(&self) -> QueueResult<()> {
        if self.capacity == 0 {
            return Err(QueueError::InvalidArgument("capacity must be positive"));
        }
        Ok(())
    }
}
