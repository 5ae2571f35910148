use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedError {
    #[error("scheduler is already started")]
    AlreadyStarted,
    #[error("scheduler is not started")]
    NotStarted,
    #[error("context cancelled")]
    ContextCancelled,
    #[error("queue backend error: {0}")]
    Backend(#[from] frontier_queue::QueueError),
}

impl From<frontier_lifecycle::LifecycleError> for SchedError {
    fn from(e: frontier_lifecycle::LifecycleError) -> Self {
        match e {
            frontier_lifecycle::LifecycleError::AlreadyStarted => SchedError::AlreadyStarted,
            frontier_lifecycle::LifecycleError::NotStarted => SchedError::NotStarted,
        }
    }
}
