//! Store abstractions
//!
//! The service talks to persistence only through these traits, so the in-memory and
//! PostgreSQL backends are interchangeable.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use mediaconv_core::{ConversionJob, MediaItem, NewMediaItem};
use uuid::Uuid;

use super::error::StoreResult;

/// Canonical record store for media items.
///
/// Every mutation is atomic at record granularity: readers see either the previous or the
/// new variant sequence, never a mix.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Persist a new item with an empty variant sequence.
    async fn create(&self, item: NewMediaItem) -> StoreResult<MediaItem>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<MediaItem>>;

    /// Replace the whole processed variant sequence. Last writer wins.
    async fn replace_variants(&self, id: Uuid, variants: Vec<Bytes>) -> StoreResult<()>;

    async fn rename(&self, id: Uuid, file_name: Option<String>) -> StoreResult<MediaItem>;

    /// Returns false if the item did not exist.
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;

    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> StoreResult<()>;
}

/// Durable job transport with delayed redelivery and late acknowledgement.
///
/// A claimed job stays in the store until `acknowledge`; a claim that is never
/// acknowledged or rescheduled is eventually handed back by `release_stale`.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert(&self, job: &ConversionJob) -> StoreResult<()>;

    /// Claim the oldest job that is due and whose media has no running job, moving it to
    /// `Running`. Returns `None` when nothing is claimable.
    async fn claim_next(&self, now: DateTime<Utc>) -> StoreResult<Option<ConversionJob>>;

    /// Persist a failed attempt (status, attempt, `available_at`, last error) for a job
    /// still held under `claimed_at`.
    async fn reschedule(&self, job: &ConversionJob, claimed_at: DateTime<Utc>)
        -> StoreResult<()>;

    /// Remove a job that reached a terminal state under `claimed_at`.
    async fn acknowledge(&self, job_id: Uuid, claimed_at: DateTime<Utc>) -> StoreResult<()>;

    /// Return `Running` jobs claimed before `claimed_before` to `Pending`.
    async fn release_stale(&self, claimed_before: DateTime<Utc>) -> StoreResult<u64>;

    async fn get(&self, job_id: Uuid) -> StoreResult<Option<ConversionJob>>;

    /// Jobs not yet acknowledged, running ones included.
    async fn outstanding_count(&self) -> StoreResult<u64>;

    async fn ping(&self) -> StoreResult<()>;
}
