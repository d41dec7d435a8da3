use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::upload::UploadResponse;
use crate::services::MediaLifecycleService;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RenameMediaRequest {
    /// New file name; null clears it
    pub file_name: Option<String>,
}

#[utoipa::path(
    patch,
    path = "/media/{media_id}",
    tag = "converter",
    params(("media_id" = Uuid, Path, description = "Media item ID")),
    request_body = RenameMediaRequest,
    responses(
        (status = 200, description = "Media renamed", body = UploadResponse),
        (status = 404, description = "Media not found", body = ErrorResponse)
    )
)]
pub async fn rename_media(
    State(state): State<Arc<AppState>>,
    Path(media_id): Path<Uuid>,
    Json(request): Json<RenameMediaRequest>,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let item = MediaLifecycleService::rename(&state, media_id, request.file_name).await?;
    Ok(Json(UploadResponse {
        id: item.id,
        file_name: item.file_name,
        file_type: item.file_type,
    }))
}

#[utoipa::path(
    delete,
    path = "/media/{media_id}",
    tag = "converter",
    params(("media_id" = Uuid, Path, description = "Media item ID")),
    responses(
        (status = 204, description = "Media deleted"),
        (status = 404, description = "Media not found", body = ErrorResponse)
    )
)]
pub async fn delete_media(
    State(state): State<Arc<AppState>>,
    Path(media_id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    MediaLifecycleService::delete(&state, media_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
