//! In-process store backends, used when no database is configured and in tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use mediaconv_core::{ConversionJob, JobStatus, MediaItem, NewMediaItem};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::error::{StoreError, StoreResult};
use super::traits::{JobStore, MediaStore};

#[derive(Default)]
pub struct InMemoryMediaStore {
    items: RwLock<HashMap<Uuid, MediaItem>>,
}

impl InMemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn create(&self, item: NewMediaItem) -> StoreResult<MediaItem> {
        let item = item.into_item(Uuid::new_v4(), Utc::now());
        self.items.write().await.insert(item.id, item.clone());
        Ok(item)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<MediaItem>> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn replace_variants(&self, id: Uuid, variants: Vec<Bytes>) -> StoreResult<()> {
        let mut items = self.items.write().await;
        let item = items.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        item.processed_variants = variants;
        item.updated_at = Utc::now();
        Ok(())
    }

    async fn rename(&self, id: Uuid, file_name: Option<String>) -> StoreResult<MediaItem> {
        let mut items = self.items.write().await;
        let item = items.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        item.file_name = file_name;
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.items.write().await.remove(&id).is_some())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: Mutex<HashMap<Uuid, ConversionJob>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn held_by(job: &ConversionJob, claimed_at: DateTime<Utc>) -> bool {
    job.status == JobStatus::Running && job.claimed_at == Some(claimed_at)
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn insert(&self, job: &ConversionJob) -> StoreResult<()> {
        self.jobs.lock().await.insert(job.id, job.clone());
        Ok(())
    }

    async fn claim_next(&self, now: DateTime<Utc>) -> StoreResult<Option<ConversionJob>> {
        let mut jobs = self.jobs.lock().await;

        let busy_media: HashSet<Uuid> = jobs
            .values()
            .filter(|job| job.status == JobStatus::Running)
            .map(|job| job.media_id)
            .collect();

        let next_id = jobs
            .values()
            .filter(|job| job.is_claimable(now) && !busy_media.contains(&job.media_id))
            .min_by_key(|job| (job.available_at, job.created_at))
            .map(|job| job.id);

        Ok(next_id.and_then(|id| {
            jobs.get_mut(&id).map(|job| {
                job.start(now);
                job.clone()
            })
        }))
    }

    async fn reschedule(
        &self,
        job: &ConversionJob,
        claimed_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut jobs = self.jobs.lock().await;
        match jobs.get_mut(&job.id) {
            Some(stored) if held_by(stored, claimed_at) => {
                *stored = job.clone();
                Ok(())
            }
            _ => Err(StoreError::ClaimLost(job.id)),
        }
    }

    async fn acknowledge(&self, job_id: Uuid, claimed_at: DateTime<Utc>) -> StoreResult<()> {
        let mut jobs = self.jobs.lock().await;
        match jobs.get(&job_id) {
            Some(stored) if held_by(stored, claimed_at) => {
                jobs.remove(&job_id);
                Ok(())
            }
            _ => Err(StoreError::ClaimLost(job_id)),
        }
    }

    async fn release_stale(&self, claimed_before: DateTime<Utc>) -> StoreResult<u64> {
        let now = Utc::now();
        let mut released = 0;
        for job in self.jobs.lock().await.values_mut() {
            let stale = job.status == JobStatus::Running
                && job.claimed_at.is_some_and(|claimed| claimed < claimed_before);
            if stale {
                job.release(now);
                released += 1;
            }
        }
        Ok(released)
    }

    async fn get(&self, job_id: Uuid) -> StoreResult<Option<ConversionJob>> {
        Ok(self.jobs.lock().await.get(&job_id).cloned())
    }

    async fn outstanding_count(&self) -> StoreResult<u64> {
        Ok(self.jobs.lock().await.len() as u64)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
