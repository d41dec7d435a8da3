//! Job execution error types
//!
//! Lets a job handler tell the queue whether a failure is worth another attempt.
//! Anything not explicitly marked is treated as retryable.

use std::fmt;

/// Job execution error carrying a retry classification.
#[derive(Debug)]
pub struct TaskError {
    inner: anyhow::Error,
    recoverable: bool,
}

impl TaskError {
    /// The job fails terminally on this error regardless of remaining attempts.
    ///
    /// Used when the work can never succeed, e.g. the referenced media item is gone.
    pub fn unrecoverable(err: impl Into<anyhow::Error>) -> Self {
        Self {
            inner: err.into(),
            recoverable: false,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.recoverable
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl std::error::Error for TaskError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

/// Returns true unless `err` wraps a `TaskError` marked unrecoverable.
pub fn is_retryable(err: &anyhow::Error) -> bool {
    err.downcast_ref::<TaskError>()
        .map(TaskError::is_recoverable)
        .unwrap_or(true)
}

/// Marks the error side of a `Result` as unrecoverable.
pub trait TaskResultExt<T> {
    fn unrecoverable(self) -> anyhow::Result<T>;
}

impl<T, E: Into<anyhow::Error>> TaskResultExt<T> for Result<T, E> {
    fn unrecoverable(self) -> anyhow::Result<T> {
        self.map_err(|e| TaskError::unrecoverable(e).into())
    }
}
