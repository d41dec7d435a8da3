//! Media lifecycle operations: renaming and deletion.

use mediaconv_core::{AppError, MediaItem};
use uuid::Uuid;

use crate::state::AppState;

pub struct MediaLifecycleService;

impl MediaLifecycleService {
    /// Replace the stored file name; `None` clears it.
    #[tracing::instrument(skip(state))]
    pub async fn rename(
        state: &AppState,
        id: Uuid,
        file_name: Option<String>,
    ) -> Result<MediaItem, AppError> {
        Ok(state.media_store.rename(id, file_name).await?)
    }

    /// Remove the record. Jobs still queued for it end terminal when a worker finds the
    /// media gone.
    #[tracing::instrument(skip(state))]
    pub async fn delete(state: &AppState, id: Uuid) -> Result<(), AppError> {
        if !state.media_store.delete(id).await? {
            return Err(AppError::NotFound(format!("Media {} not found", id)));
        }
        tracing::info!(media_id = %id, "Media deleted");
        Ok(())
    }
}
