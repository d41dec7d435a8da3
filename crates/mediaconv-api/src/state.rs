//! Application state shared by HTTP handlers and the conversion job handler.

use std::sync::Arc;

use mediaconv_core::Config;
use mediaconv_db::MediaStore;
use mediaconv_processing::Rasterizer;
use mediaconv_worker::JobQueue;

/// Submission limits applied before anything is persisted.
#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub max_upload_size_bytes: usize,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub media_store: Arc<dyn MediaStore>,
    pub job_queue: JobQueue,
    pub rasterizer: Rasterizer,
    pub upload: UploadConfig,
}

impl AppState {
    pub fn new(
        config: Config,
        media_store: Arc<dyn MediaStore>,
        job_queue: JobQueue,
        rasterizer: Rasterizer,
    ) -> Self {
        let upload = UploadConfig {
            max_upload_size_bytes: config.max_upload_size_bytes(),
        };
        Self {
            config,
            media_store,
            job_queue,
            rasterizer,
            upload,
        }
    }
}
