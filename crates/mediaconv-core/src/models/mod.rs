pub mod job;
pub mod media;

pub use job::{ConversionJob, FailureOutcome, JobStatus};
pub use media::{FileType, MediaItem, MediaSource, MediaView, NewMediaItem};
