//! Processing error types

use mediaconv_core::{AppError, FileType};

/// Request-time classification failures. Never retried.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("Unsupported file format: content is not a PDF, PNG or JPEG")]
    UnsupportedFormat,

    #[error("Declared file type {declared} does not match detected type {detected}")]
    TypeMismatch {
        declared: FileType,
        detected: FileType,
    },
}

/// Rasterization failures. Retryable from the job queue's point of view.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode PNG: {0}")]
    Encode(String),

    #[error("Unreadable PDF document: {0}")]
    Unreadable(String),

    #[error("PDF document is password protected")]
    PasswordProtected,

    #[error("PDF document has no pages")]
    EmptyDocument,

    #[error("Failed to render page {page}: {detail}")]
    Render { page: usize, detail: String },

    #[error("Renderer produced {rendered} pages for a {expected}-page document")]
    PageCountMismatch { expected: usize, rendered: usize },

    #[error("PDF renderer unavailable: {0}")]
    RendererUnavailable(String),

    #[error("Conversion task failed: {0}")]
    Join(String),
}

impl From<image::ImageError> for ConversionError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Encoding(e) => ConversionError::Encode(e.to_string()),
            other => ConversionError::Decode(other.to_string()),
        }
    }
}

impl From<DetectionError> for AppError {
    fn from(err: DetectionError) -> Self {
        match err {
            DetectionError::UnsupportedFormat => AppError::UnsupportedFormat(err.to_string()),
            DetectionError::TypeMismatch { declared, detected } => {
                AppError::TypeMismatch { declared, detected }
            }
        }
    }
}

impl From<ConversionError> for AppError {
    fn from(err: ConversionError) -> Self {
        AppError::Conversion(err.to_string())
    }
}
