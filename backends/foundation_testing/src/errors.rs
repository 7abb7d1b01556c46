use core::any::Any;
use core::time::Duration;

use derive_more::From;
use foundation_queue::QueueError;

pub type ScenarioResult<T> = core::result::Result<T, ScenarioError>;

/// Failures of a scenario or stress run, as opposed to failures of the
/// properties being checked, which are reported in the results.
#[derive(From, Debug)]
pub enum ScenarioError {
    Queue(QueueError),

    /// A producer, consumer or probe thread panicked.
    #[from(ignore)]
    Paniced(Box<dyn Any + Send>),

    /// A probed call did not return within the allowed time.
    #[from(ignore)]
    TimedOut(Duration),
}

impl core::error::Error for ScenarioError {}

impl core::fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Queue(err) => write!(f, "ScenarioError::Queue({err})"),
            Self::Paniced(_) => write!(f, "ScenarioError::Paniced(_)"),
            Self::TimedOut(limit) => write!(f, "ScenarioError::TimedOut({limit:?})"),
        }
    }
}
