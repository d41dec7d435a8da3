//! mediaconv worker library
//!
//! Durable conversion job queue with a fixed-size worker pool, retry with backoff and
//! jitter, late acknowledgement and a stale-claim reaper.

pub mod context;
pub mod queue;

pub use context::JobHandlerContext;
pub use queue::{JobFinishedSender, JobQueue, JobQueueConfig};
