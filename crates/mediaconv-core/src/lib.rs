//! mediaconv core library
//!
//! Domain models, error types, configuration and the partial-retrieval rules shared by
//! every mediaconv crate.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod retrieval;
pub mod task_error;

// Re-export commonly used types
pub use config::{BaseConfig, Config, LogFormat, MediaConverterConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    ConversionJob, FailureOutcome, FileType, JobStatus, MediaItem, MediaSource, MediaView,
    NewMediaItem,
};
pub use retrieval::select_view;
pub use task_error::{is_retryable, TaskError, TaskResultExt};
