//! mediaconv API library
//!
//! Submission and retrieval boundaries, the conversion job handler the worker pool
//! dispatches to, and the axum HTTP surface over them.

mod api_doc;
pub mod constants;
pub mod error;
mod handlers;
pub mod services;
pub mod setup;
pub mod state;
mod task_dispatch;
mod task_handlers;
mod telemetry;

pub use error::{ErrorResponse, HttpAppError};
pub use mediaconv_worker::{JobQueue, JobQueueConfig};
pub use state::AppState;
pub use task_handlers::{ConversionTaskHandler, JobHandler};
