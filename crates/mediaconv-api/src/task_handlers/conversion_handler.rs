use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use mediaconv_core::{ConversionJob, TaskResultExt};
use mediaconv_db::StoreError;
use mediaconv_processing::FormatDetector;

use super::JobHandler;
use crate::state::AppState;

/// Re-checks a media item's raw payload, rasterizes it and replaces its processed variants.
///
/// Re-running it for the same item is safe: the variant sequence is swapped whole, so a
/// redelivered job overwrites rather than appends.
pub struct ConversionTaskHandler;

#[async_trait]
impl JobHandler for ConversionTaskHandler {
    #[tracing::instrument(skip(self, job, state), fields(job_id = %job.id, media_id = %job.media_id, attempt = job.attempt))]
    async fn process(&self, job: &ConversionJob, state: Arc<AppState>) -> Result<()> {
        let media = state
            .media_store
            .get(job.media_id)
            .await
            .context("Failed to load media item")?
            .ok_or(StoreError::NotFound(job.media_id))
            .unrecoverable()?;

        tracing::info!(
            file_type = %media.file_type,
            raw_size = media.raw_payload.len(),
            "Converting media"
        );

        let declared = media.file_type;
        let payload = media.raw_payload.clone();
        tokio::task::spawn_blocking(move || FormatDetector::confirm(declared, &payload))
            .await
            .context("Format detection task failed")?
            .with_context(|| format!("Stored payload is not a valid {}", declared))?;

        let variants = state
            .rasterizer
            .rasterize(media.file_type, media.raw_payload.clone())
            .await
            .with_context(|| format!("Failed to rasterize {} payload", media.file_type))?;
        let variant_count = variants.len();

        match state.media_store.replace_variants(media.id, variants).await {
            Ok(()) => {}
            Err(e @ StoreError::NotFound(_)) => {
                return Err::<(), _>(e)
                    .context("Media deleted during conversion")
                    .unrecoverable();
            }
            Err(e) => return Err(e).context("Failed to store processed variants"),
        }

        tracing::info!(variant_count = variant_count, "Media converted");
        Ok(())
    }
}
