use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mediaconv_core::{ConversionJob, JobStatus};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::error::{StoreError, StoreResult};
use super::traits::JobStore;

const JOB_COLUMNS: &str = "id, media_id, status, attempt, max_attempts, available_at, \
                           claimed_at, last_error, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    media_id: Uuid,
    status: String,
    attempt: i32,
    max_attempts: i32,
    available_at: DateTime<Utc>,
    claimed_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for ConversionJob {
    type Error = StoreError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let status: JobStatus = row
            .status
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("job {}: {}", row.id, e)))?;
        let counter = |value: i32, column: &str| {
            u32::try_from(value)
                .map_err(|_| StoreError::Corrupt(format!("job {}: negative {}", row.id, column)))
        };

        Ok(ConversionJob {
            id: row.id,
            media_id: row.media_id,
            status,
            attempt: counter(row.attempt, "attempt")?,
            max_attempts: counter(row.max_attempts, "max_attempts")?,
            available_at: row.available_at,
            claimed_at: row.claimed_at,
            last_error: row.last_error,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// PostgreSQL job transport.
///
/// Claiming uses `FOR UPDATE SKIP LOCKED`; the partial unique index on running jobs per
/// media turns a lost race into a `Conflict` rather than two concurrent attempts.
#[derive(Clone)]
pub struct JobRepository {
    pool: PgPool,
}

impl JobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for JobRepository {
    #[tracing::instrument(skip(self, job), fields(job_id = %job.id, media_id = %job.media_id))]
    async fn insert(&self, job: &ConversionJob) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO conversion_jobs (
                id, media_id, status, attempt, max_attempts, available_at,
                claimed_at, last_error, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(job.id)
        .bind(job.media_id)
        .bind(job.status.as_str())
        .bind(job.attempt as i32)
        .bind(job.max_attempts as i32)
        .bind(job.available_at)
        .bind(job.claimed_at)
        .bind(job.last_error.as_deref())
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn claim_next(&self, now: DateTime<Utc>) -> StoreResult<Option<ConversionJob>> {
        let mut tx = self.pool.begin().await?;

        let next: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT j.id
            FROM conversion_jobs j
            WHERE j.status IN ('pending', 'failed_retryable')
                AND j.available_at <= $1
                AND NOT EXISTS (
                    SELECT 1 FROM conversion_jobs r
                    WHERE r.media_id = j.media_id AND r.status = 'running'
                )
            ORDER BY j.available_at ASC, j.created_at ASC
            LIMIT 1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((job_id,)) = next else {
            tx.rollback().await?;
            return Ok(None);
        };

        let row = sqlx::query_as::<Postgres, JobRow>(&format!(
            r#"
            UPDATE conversion_jobs
            SET status = 'running',
                claimed_at = $2,
                updated_at = $2
            WHERE id = $1
            RETURNING {}
            "#,
            JOB_COLUMNS
        ))
        .bind(job_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let job = ConversionJob::try_from(row)?;
        tracing::debug!(job_id = %job.id, media_id = %job.media_id, "Job claimed");
        Ok(Some(job))
    }

    #[tracing::instrument(skip(self, job), fields(job_id = %job.id, attempt = job.attempt))]
    async fn reschedule(
        &self,
        job: &ConversionJob,
        claimed_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE conversion_jobs
            SET status = $3,
                attempt = $4,
                available_at = $5,
                claimed_at = NULL,
                last_error = $6,
                updated_at = NOW()
            WHERE id = $1 AND status = 'running' AND claimed_at = $2
            "#,
        )
        .bind(job.id)
        .bind(claimed_at)
        .bind(job.status.as_str())
        .bind(job.attempt as i32)
        .bind(job.available_at)
        .bind(job.last_error.as_deref())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::ClaimLost(job.id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn acknowledge(&self, job_id: Uuid, claimed_at: DateTime<Utc>) -> StoreResult<()> {
        let result = sqlx::query(
            "DELETE FROM conversion_jobs WHERE id = $1 AND status = 'running' AND claimed_at = $2",
        )
        .bind(job_id)
        .bind(claimed_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::ClaimLost(job_id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn release_stale(&self, claimed_before: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE conversion_jobs
            SET status = 'pending',
                claimed_at = NULL,
                available_at = NOW(),
                updated_at = NOW()
            WHERE status = 'running' AND claimed_at < $1
            "#,
        )
        .bind(claimed_before)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    #[tracing::instrument(skip(self))]
    async fn get(&self, job_id: Uuid) -> StoreResult<Option<ConversionJob>> {
        let row = sqlx::query_as::<Postgres, JobRow>(&format!(
            "SELECT {} FROM conversion_jobs WHERE id = $1",
            JOB_COLUMNS
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ConversionJob::try_from).transpose()
    }

    async fn outstanding_count(&self) -> StoreResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM conversion_jobs")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
