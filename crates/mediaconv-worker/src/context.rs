//! Job handler context trait
//!
//! The API implements this trait for its application state. Workers call
//! `dispatch_job` for every claimed job and classify the returned error.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use mediaconv_core::ConversionJob;

/// Context for job dispatch.
///
/// The worker pool holds a weak reference, so dropping the application state stops
/// dispatch without a reference cycle through the queue.
#[async_trait]
pub trait JobHandlerContext: Send + Sync {
    /// Run one attempt of `job`. Errors are retried unless wrapped in
    /// `TaskError::unrecoverable`.
    async fn dispatch_job(self: Arc<Self>, job: &ConversionJob) -> Result<()>;
}
