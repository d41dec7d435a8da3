//! Submission boundary: validate, persist, enqueue.

use bytes::Bytes;
use mediaconv_core::{AppError, FileType, MediaItem, NewMediaItem};
use mediaconv_processing::FormatDetector;

use crate::state::AppState;

/// One uploaded file as received from the transport.
#[derive(Debug, Clone)]
pub struct MediaSubmission {
    pub raw_payload: Bytes,
    pub declared_type: FileType,
    pub file_name: Option<String>,
}

/// Accepts uploads. Returns once the item is stored and its conversion job is queued;
/// conversion itself happens on the worker pool.
pub struct MediaSubmissionService<'a> {
    state: &'a AppState,
}

impl<'a> MediaSubmissionService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Rejections (size, unsupported format, type mismatch) happen before anything is
    /// persisted.
    #[tracing::instrument(
        skip(self, submission),
        fields(
            declared_type = %submission.declared_type,
            size = submission.raw_payload.len(),
            media_id = tracing::field::Empty
        )
    )]
    pub async fn submit(&self, submission: MediaSubmission) -> Result<MediaItem, AppError> {
        let max_size = self.state.upload.max_upload_size_bytes;
        if submission.raw_payload.len() > max_size {
            return Err(AppError::PayloadTooLarge(format!(
                "{} bytes exceeds max {} bytes",
                submission.raw_payload.len(),
                max_size
            )));
        }

        let payload = submission.raw_payload.clone();
        let declared = submission.declared_type;
        // Verification decodes the payload, so it runs on the blocking pool.
        tokio::task::spawn_blocking(move || FormatDetector::confirm(declared, &payload))
            .await
            .map_err(|e| AppError::Internal(format!("Format detection task failed: {}", e)))??;

        let item = self
            .state
            .media_store
            .create(NewMediaItem {
                file_name: submission.file_name,
                file_type: declared,
                raw_payload: submission.raw_payload,
            })
            .await
            .map_err(|e| AppError::StoreWrite(e.to_string()))?;
        tracing::Span::current().record("media_id", item.id.to_string());

        if let Err(e) = self.state.job_queue.enqueue(item.id).await {
            tracing::error!(media_id = %item.id, error = %e, "Media stored but conversion job was not queued");
            return Err(AppError::StoreWrite(format!(
                "Failed to queue conversion for media {}: {}",
                item.id, e
            )));
        }

        tracing::info!(media_id = %item.id, "Media submitted");
        Ok(item)
    }
}
