//! Retrieval boundary.

use mediaconv_core::{select_view, AppError, MediaSource, MediaView};
use uuid::Uuid;

use crate::state::AppState;

pub struct MediaRetrievalService;

impl MediaRetrievalService {
    /// Load `id` and cut the view `source`/`indices` asks for.
    pub async fn get_media_view(
        state: &AppState,
        id: Uuid,
        source: MediaSource,
        indices: &[i64],
    ) -> Result<MediaView, AppError> {
        let item = state
            .media_store
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Media {} not found", id)))?;

        select_view(&item, source, indices)
    }
}
