mod conversion_handler;

pub use conversion_handler::ConversionTaskHandler;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::state::AppState;
use mediaconv_core::ConversionJob;

/// Trait for job handlers.
///
/// Errors are retried by the queue unless wrapped in `TaskError::unrecoverable`. CPU-bound
/// work belongs on the blocking pool (`tokio::task::spawn_blocking`).
#[async_trait]
pub trait JobHandler {
    async fn process(&self, job: &ConversionJob, state: Arc<AppState>) -> Result<()>;
}
