//! OpenAPI documentation, served at `/api-docs/openapi.json`.

use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::handlers;
use mediaconv_core::{FileType, MediaSource};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "mediaconv API",
        version = "0.1.0",
        description = "Upload images and PDFs, convert them to bounded PNG variants in the background, and retrieve raw or processed payloads."
    ),
    paths(
        handlers::root::root,
        handlers::upload::upload_media,
        handlers::download::download_media,
        handlers::media::rename_media,
        handlers::media::delete_media,
    ),
    components(schemas(
        ErrorResponse,
        FileType,
        MediaSource,
        handlers::upload::UploadResponse,
        handlers::download::DownloadResponse,
        handlers::media::RenameMediaRequest,
    )),
    tags(
        (name = "converter", description = "Media upload, conversion and retrieval")
    )
)]
pub struct ApiDoc;
