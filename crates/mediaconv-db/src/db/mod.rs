//! Persistence for media items and conversion jobs
//!
//! `traits` defines the store contracts. `memory` holds the in-process backends;
//! `media` and `job` are the PostgreSQL repositories.

pub mod error;
pub mod job;
pub mod media;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use job::JobRepository;
pub use media::MediaRepository;
pub use memory::{InMemoryJobStore, InMemoryMediaStore};
pub use traits::{JobStore, MediaStore};
