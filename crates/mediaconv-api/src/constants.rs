//! API constants

/// Multipart field carrying the uploaded file.
pub const UPLOAD_FILE_FIELD: &str = "file";

/// Headroom above the upload limit for multipart framing, so oversized files reach the
/// explicit size check and get a 413 with our error body.
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Timeout applied to each dependency probe in the health endpoints.
pub const HEALTH_CHECK_TIMEOUT_SECS: u64 = 5;
