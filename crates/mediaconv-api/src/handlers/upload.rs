use std::sync::Arc;

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use mediaconv_core::{AppError, FileType};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::constants::UPLOAD_FILE_FIELD;
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::{MediaSubmission, MediaSubmissionService};
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct UploadQuery {
    /// Declared type of the uploaded file: PDF, PNG, JPG or JPEG
    pub file_type: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub id: Uuid,
    pub file_name: Option<String>,
    pub file_type: FileType,
}

fn parse_file_type(raw: Option<&str>) -> Result<FileType, AppError> {
    let raw = raw.ok_or_else(|| {
        AppError::InvalidInput("file_type query parameter is required".to_string())
    })?;
    raw.parse()
        .map_err(|_| AppError::UnsupportedFormat(format!("Unsupported file type '{}'", raw)))
}

/// Pull the upload field out of the multipart body, ignoring any other fields.
async fn read_upload_field(
    multipart: &mut Multipart,
) -> Result<(Option<String>, Bytes), HttpAppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(String::from);
        let bytes = field.bytes().await?;
        return Ok((file_name, bytes));
    }

    Err(AppError::InvalidInput(format!(
        "Multipart body has no '{}' field",
        UPLOAD_FILE_FIELD
    ))
    .into())
}

/// Upload a file for conversion.
///
/// The file is validated against the declared type and stored; conversion to PNG runs in
/// the background. Returns a one-element list describing the stored item.
#[utoipa::path(
    post,
    path = "/upload",
    tag = "converter",
    params(UploadQuery),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Media stored and queued for conversion", body = [UploadResponse]),
        (status = 400, description = "Unsupported format or type mismatch", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(file_type = ?query.file_type))]
pub async fn upload_media(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<UploadResponse>>), HttpAppError> {
    let declared_type = parse_file_type(query.file_type.as_deref())?;
    let (file_name, raw_payload) = read_upload_field(&mut multipart).await?;

    let item = MediaSubmissionService::new(&state)
        .submit(MediaSubmission {
            raw_payload,
            declared_type,
            file_name,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(vec![UploadResponse {
            id: item.id,
            file_name: item.file_name,
            file_type: item.file_type,
        }]),
    ))
}
