use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use mediaconv_core::{AppError, FileType, MediaSource, MediaView};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{ErrorResponse, HttpAppError};
use crate::services::MediaRetrievalService;
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct DownloadQuery {
    /// Comma-separated processed variant indices; `-1` alone selects all
    pub idx: Option<String>,
}

/// Retrieved media with every binary field base64-encoded.
#[derive(Debug, Serialize, ToSchema)]
pub struct DownloadResponse {
    pub id: Uuid,
    pub idx: Vec<i64>,
    pub file_name: Option<String>,
    pub file_type: FileType,
    pub processed_total_count: usize,
    pub processed_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_files: Option<Vec<String>>,
}

impl From<MediaView> for DownloadResponse {
    fn from(view: MediaView) -> Self {
        Self {
            id: view.id,
            idx: view.indices,
            file_name: view.file_name,
            file_type: view.file_type,
            processed_total_count: view.processed_total_count,
            processed_count: view.processed_count,
            raw_file: view.raw_payload.map(|raw| STANDARD.encode(raw)),
            processed_files: view
                .processed_variants
                .map(|variants| variants.iter().map(|v| STANDARD.encode(v)).collect()),
        }
    }
}

/// Parse `idx=2,0,-1`. A missing or blank value means "all".
fn parse_indices(raw: Option<&str>) -> Result<Vec<i64>, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(Vec::new());
    };

    raw.split(',')
        .map(|part| {
            part.trim().parse::<i64>().map_err(|_| {
                AppError::BadRequest(format!(
                    "Invalid indexes selected: '{}' is not an integer",
                    part.trim()
                ))
            })
        })
        .collect()
}

fn parse_source(raw: &str) -> Result<MediaSource, AppError> {
    raw.parse().map_err(|_| {
        AppError::BadRequest(format!(
            "Invalid source '{}': expected raw, processed or all",
            raw
        ))
    })
}

/// Fetch a media item's raw payload, processed variants, or both.
#[utoipa::path(
    get,
    path = "/download/{source}/{media_id}",
    tag = "converter",
    params(
        ("source" = MediaSource, Path, description = "raw, processed or all"),
        ("media_id" = Uuid, Path, description = "Media item ID"),
        DownloadQuery
    ),
    responses(
        (status = 200, description = "Requested payloads", body = DownloadResponse),
        (status = 400, description = "Invalid source or index selection", body = ErrorResponse),
        (status = 404, description = "Media not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn download_media(
    State(state): State<Arc<AppState>>,
    Path((source, media_id)): Path<(String, String)>,
    Query(query): Query<DownloadQuery>,
) -> Result<Json<DownloadResponse>, HttpAppError> {
    let source = parse_source(&source)?;
    let media_id = Uuid::parse_str(&media_id)
        .map_err(|_| AppError::InvalidInput(format!("Invalid media id '{}'", media_id)))?;
    let indices = parse_indices(query.idx.as_deref())?;

    let view =
        MediaRetrievalService::get_media_view(&state, media_id, source, &indices).await?;

    Ok(Json(DownloadResponse::from(view)))
}
