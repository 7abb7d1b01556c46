// region -- QueueError

pub type QueueResult<T> = core::result::Result<T, QueueError>;

#[derive(Debug, derive_more::From)]
pub enum QueueError {
    /// A constructor or configuration argument was rejected, e.g. a
    /// capacity of zero.
    #[from(ignore)]
    InvalidArgument(&'static str),

    /// A blocking wait was aborted by its [`crate::CancellationToken`]
    /// before its condition was satisfied.
    #[from(ignore)]
    Cancelled,

    /// A TOML queue configuration failed to parse.
    Config(toml::de::Error),
}

impl QueueError {
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, QueueError::Cancelled)
    }

    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, QueueError::InvalidArgument(_))
    }
}

impl core::error::Error for QueueError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            QueueError::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl core::fmt::Display for QueueError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            QueueError::InvalidArgument(reason) => {
                write!(f, "QueueError::InvalidArgument({reason})")
            }
            QueueError::Cancelled => write!(f, "QueueError::Cancelled"),
            QueueError::Config(err) => write!(f, "QueueError::Config({err})"),
        }
    }
}

// --- end region: QueueError

// region -- insert side outcomes

/// Returned by [`crate::BoundedBlockingQueue::put_cancellable`] when the wait
/// for a free slot was cancelled. The rejected item is handed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cancelled<T>(pub T);

impl<T> Cancelled<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> From<Cancelled<T>> for QueueError {
    fn from(_: Cancelled<T>) -> Self {
        QueueError::Cancelled
    }
}

impl<T: core::fmt::Debug> core::error::Error for Cancelled<T> {}

impl<T> core::fmt::Display for Cancelled<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Cancelled(_)")
    }
}

/// Outcome of a timed insert that did not happen.
///
/// `Full` is the timeout case and is not a failure of the queue, it only
/// means no slot freed up in time. Either way the item comes back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfferError<T> {
    Full(T),
    Cancelled(T),
}

impl<T> OfferError<T> {
    #[must_use]
    pub fn is_full(&self) -> bool {
        matches!(self, OfferError::Full(_))
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, OfferError::Cancelled(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            OfferError::Full(item) | OfferError::Cancelled(item) => item,
        }
    }
}

impl<T> From<Cancelled<T>> for OfferError<T> {
    fn from(value: Cancelled<T>) -> Self {
        OfferError::Cancelled(value.0)
    }
}

impl<T: core::fmt::Debug> core::error::Error for OfferError<T> {}

impl<T> core::fmt::Display for OfferError<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            OfferError::Full(_) => write!(f, "OfferError::Full(_)"),
            OfferError::Cancelled(_) => write!(f, "OfferError::Cancelled(_)"),
        }
    }
}

// --- end region: insert side outcomes
