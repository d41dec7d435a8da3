//! JobHandlerContext implementation for AppState.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use mediaconv_core::ConversionJob;
use mediaconv_worker::JobHandlerContext;

use crate::state::AppState;
use crate::task_handlers::{ConversionTaskHandler, JobHandler};

#[async_trait]
impl JobHandlerContext for AppState {
    async fn dispatch_job(self: Arc<Self>, job: &ConversionJob) -> Result<()> {
        ConversionTaskHandler.process(job, self).await
    }
}
