//! Service layer between HTTP handlers and the stores.
//!
//! Keeps handler logic thin and lets the boundaries be tested without HTTP.

pub mod media_lifecycle;
pub mod retrieval;
pub mod submission;

pub use media_lifecycle::MediaLifecycleService;
pub use retrieval::MediaRetrievalService;
pub use submission::{MediaSubmission, MediaSubmissionService};
