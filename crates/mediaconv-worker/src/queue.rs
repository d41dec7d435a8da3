//! Conversion job queue: submission, claiming, retry and the worker pool.
//!
//! Jobs are acknowledged late: a claimed job stays in the store as `Running` until its
//! attempt finishes, and a claim whose worker disappeared is handed back by the reaper
//! once the visibility timeout passes.
//!
//! Shutdown: [`JobQueue::shutdown`] stops workers from claiming. It does not wait for
//! in-flight attempts; an attempt interrupted by process exit is redelivered later.

use anyhow::{Context, Result};
use chrono::Utc;
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use mediaconv_core::{is_retryable, Config, ConversionJob, FailureOutcome};
use mediaconv_db::{JobStore, StoreError};

use crate::context::JobHandlerContext;

/// Receives every job that reached `Succeeded` or `FailedTerminal`.
pub type JobFinishedSender = mpsc::Sender<ConversionJob>;

#[derive(Debug, Clone)]
pub struct JobQueueConfig {
    pub max_workers: usize,
    pub poll_interval: Duration,
    pub max_attempts: u32,
    pub retry_base_delay: Duration,
    pub retry_max_backoff: Duration,
    /// Upper bound on a single attempt; exceeding it counts as a retryable failure.
    pub job_timeout: Duration,
    /// Age after which a `Running` claim is considered abandoned.
    pub visibility_timeout: Duration,
    /// Zero disables the stale-claim reaper.
    pub reap_interval: Duration,
}

impl Default for JobQueueConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            poll_interval: Duration::from_millis(1000),
            max_attempts: mediaconv_core::constants::DEFAULT_MAX_ATTEMPTS,
            retry_base_delay: Duration::from_millis(1000),
            retry_max_backoff: Duration::from_secs(600),
            job_timeout: Duration::from_secs(600),
            visibility_timeout: Duration::from_secs(900),
            reap_interval: Duration::from_secs(60),
        }
    }
}

impl From<&Config> for JobQueueConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_workers: config.job_queue_max_workers(),
            poll_interval: Duration::from_millis(config.job_queue_poll_interval_ms()),
            max_attempts: config.job_max_attempts(),
            retry_base_delay: Duration::from_millis(config.job_retry_base_delay_ms()),
            retry_max_backoff: Duration::from_secs(config.job_retry_max_backoff_secs()),
            job_timeout: Duration::from_secs(config.job_timeout_secs()),
            visibility_timeout: Duration::from_secs(config.job_visibility_timeout_secs()),
            reap_interval: Duration::from_secs(config.job_reap_interval_secs()),
        }
    }
}

/// Exponential backoff before jitter: `base * 2^(attempt - 1)`, capped at `max`.
///
/// `attempt` is the number of attempts already made, so the first retry waits `base`.
pub(crate) fn compute_retry_backoff(attempt: u32, base: Duration, max: Duration) -> Duration {
    let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
    let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
    let delay_ms = 2_u64
        .checked_pow(attempt.saturating_sub(1))
        .and_then(|factor| base_ms.checked_mul(factor))
        .unwrap_or(u64::MAX)
        .min(max_ms);
    Duration::from_millis(delay_ms)
}

/// Adds up to 100% random jitter so jobs failing together do not retry together.
fn with_jitter(delay: Duration) -> Duration {
    let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX / 2);
    let jitter_ms = if delay_ms == 0 {
        0
    } else {
        rand::rng().random_range(0..=delay_ms)
    };
    Duration::from_millis(delay_ms.saturating_add(jitter_ms))
}

/// Decrements the live worker count when a worker loop exits, including by panic.
struct LiveWorkerGuard(Arc<AtomicUsize>);

impl LiveWorkerGuard {
    fn register(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for LiveWorkerGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Handle to the job queue. Cheap to clone; clones share the store, wakeups and shutdown.
#[derive(Clone)]
pub struct JobQueue {
    store: Arc<dyn JobStore>,
    config: JobQueueConfig,
    wakeup: Arc<Notify>,
    shutdown: CancellationToken,
    live_workers: Arc<AtomicUsize>,
}

impl JobQueue {
    /// Create a queue without starting workers. Jobs enqueued before
    /// [`JobQueue::start_workers`] stay pending in the store.
    pub fn new(store: Arc<dyn JobStore>, config: JobQueueConfig) -> Self {
        Self {
            store,
            config,
            wakeup: Arc::new(Notify::new()),
            shutdown: CancellationToken::new(),
            live_workers: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Spawn `max_workers` worker loops and, when enabled, the stale-claim reaper.
    ///
    /// The context is held weakly; once it is dropped, claimed jobs are left for the
    /// reaper and the workers exit.
    pub fn start_workers(
        &self,
        context: Weak<dyn JobHandlerContext>,
        job_finished_tx: Option<JobFinishedSender>,
    ) {
        tracing::info!(
            max_workers = self.config.max_workers,
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            max_attempts = self.config.max_attempts,
            job_timeout_secs = self.config.job_timeout.as_secs(),
            "Job queue worker pool started"
        );

        for worker_id in 0..self.config.max_workers {
            let queue = self.clone();
            let context = context.clone();
            let finished_tx = job_finished_tx.clone();
            tokio::spawn(async move {
                queue.worker_loop(worker_id, context, finished_tx).await;
            });
        }

        if !self.config.reap_interval.is_zero() {
            let queue = self.clone();
            tokio::spawn(async move {
                queue.reaper_loop().await;
            });
        }
    }

    /// Create and persist a job for `media_id`, then wake one idle worker.
    #[tracing::instrument(skip(self))]
    pub async fn enqueue(&self, media_id: Uuid) -> Result<ConversionJob> {
        let job = ConversionJob::new(media_id, self.config.max_attempts, Utc::now());
        self.store.insert(&job).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to persist conversion job");
            anyhow::Error::from(e)
        })?;
        self.wakeup.notify_one();

        tracing::info!(job_id = %job.id, media_id = %media_id, "Conversion job enqueued");
        Ok(job)
    }

    /// Wait for the next claimable job and claim it.
    ///
    /// Returns `None` once the queue is shut down. A claim race lost to another worker
    /// counts as nothing claimed; other store errors are logged and the poll continues.
    pub async fn dequeue(&self) -> Option<ConversionJob> {
        loop {
            if self.shutdown.is_cancelled() {
                return None;
            }

            match self.store.claim_next(Utc::now()).await {
                Ok(Some(job)) => return Some(job),
                Ok(None) => {}
                Err(StoreError::Conflict(detail)) => {
                    tracing::debug!(detail = %detail, "Claim race lost, polling again");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to claim job from queue");
                }
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => return None,
                _ = self.wakeup.notified() => {}
                _ = sleep(self.config.poll_interval) => {}
            }
        }
    }

    /// Record a successful attempt and remove the job from the store.
    #[tracing::instrument(skip(self, job), fields(job_id = %job.id, media_id = %job.media_id))]
    pub async fn complete(&self, mut job: ConversionJob) -> Result<ConversionJob> {
        let claimed_at = job
            .claimed_at
            .ok_or_else(|| anyhow::anyhow!("job {} is not claimed", job.id))?;
        job.succeed(Utc::now());
        self.store
            .acknowledge(job.id, claimed_at)
            .await
            .context("Failed to acknowledge completed job")?;
        self.wakeup.notify_one();
        Ok(job)
    }

    /// Record a failed attempt.
    ///
    /// A retryable failure with attempts left is rescheduled after a jittered backoff;
    /// anything else ends in `FailedTerminal` and the job is removed from the store.
    #[tracing::instrument(skip(self, job, error), fields(job_id = %job.id, media_id = %job.media_id))]
    pub async fn fail(
        &self,
        mut job: ConversionJob,
        error: &anyhow::Error,
    ) -> Result<(ConversionJob, FailureOutcome)> {
        let claimed_at = job
            .claimed_at
            .ok_or_else(|| anyhow::anyhow!("job {} is not claimed", job.id))?;
        let retryable = is_retryable(error);
        let (base, max) = (self.config.retry_base_delay, self.config.retry_max_backoff);

        let outcome = job.record_failure(format!("{:#}", error), retryable, Utc::now(), |attempt| {
            let delay = with_jitter(compute_retry_backoff(attempt, base, max));
            chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::MAX)
        });

        match outcome {
            FailureOutcome::Retry { available_at } => {
                self.store
                    .reschedule(&job, claimed_at)
                    .await
                    .context("Failed to reschedule job")?;
                tracing::info!(
                    attempt = job.attempt,
                    max_attempts = job.max_attempts,
                    available_at = %available_at,
                    "Scheduling job retry"
                );
            }
            FailureOutcome::Terminal => {
                self.store
                    .acknowledge(job.id, claimed_at)
                    .await
                    .context("Failed to acknowledge failed job")?;
                tracing::error!(
                    attempt = job.attempt,
                    max_attempts = job.max_attempts,
                    retryable = retryable,
                    error = %error,
                    "Conversion job failed permanently"
                );
            }
        }

        Ok((job, outcome))
    }

    /// Return claims older than the visibility timeout to `Pending`.
    pub async fn reap_stale(&self) -> Result<u64> {
        let visibility = chrono::Duration::from_std(self.config.visibility_timeout)
            .unwrap_or(chrono::Duration::MAX);
        let released = self
            .store
            .release_stale(Utc::now() - visibility)
            .await
            .context("Failed to release stale claims")?;
        if released > 0 {
            tracing::warn!(released = released, "Released stale job claims");
            self.wakeup.notify_waiters();
        }
        Ok(released)
    }

    /// Jobs not yet acknowledged.
    pub async fn outstanding(&self) -> Result<u64> {
        Ok(self.store.outstanding_count().await?)
    }

    /// Number of worker loops currently running.
    pub fn live_workers(&self) -> usize {
        self.live_workers.load(Ordering::SeqCst)
    }

    pub async fn ping(&self) -> Result<()> {
        Ok(self.store.ping().await?)
    }

    /// Signals workers and the reaper to stop. Returns immediately.
    pub fn shutdown(&self) {
        tracing::info!("Initiating job queue shutdown");
        self.shutdown.cancel();
    }

    async fn worker_loop(
        self,
        worker_id: usize,
        context: Weak<dyn JobHandlerContext>,
        job_finished_tx: Option<JobFinishedSender>,
    ) {
        let _guard = LiveWorkerGuard::register(&self.live_workers);
        tracing::debug!(worker_id = worker_id, "Worker started");

        while let Some(job) = self.dequeue().await {
            let Some(ctx) = context.upgrade() else {
                tracing::warn!(
                    worker_id = worker_id,
                    job_id = %job.id,
                    "Job handler context dropped, leaving claim for the reaper"
                );
                break;
            };

            match self.run_attempt(ctx, job).await {
                Ok(Some(finished)) => {
                    if let Some(tx) = &job_finished_tx {
                        if let Err(mpsc::error::SendError(job)) = tx.send(finished).await {
                            tracing::debug!(
                                worker_id = worker_id,
                                job_id = %job.id,
                                status = %job.status,
                                "Job finished receiver closed, dropping event"
                            );
                        }
                    }
                }
                Ok(None) => {}
                Err(e) => match e.downcast_ref::<StoreError>() {
                    Some(StoreError::ClaimLost(job_id)) => {
                        tracing::warn!(
                            worker_id = worker_id,
                            job_id = %job_id,
                            "Claim lost while the attempt ran, dropping result"
                        );
                    }
                    _ => {
                        tracing::error!(worker_id = worker_id, error = %e, "Failed to record attempt");
                    }
                },
            }
        }

        tracing::debug!(worker_id = worker_id, "Worker stopped");
    }

    /// Run one attempt. Returns the job when it reached a terminal state.
    async fn run_attempt(
        &self,
        ctx: Arc<dyn JobHandlerContext>,
        job: ConversionJob,
    ) -> Result<Option<ConversionJob>> {
        let job_id = job.id;
        let result = tokio::time::timeout(self.config.job_timeout, ctx.dispatch_job(&job)).await;

        match result {
            Ok(Ok(())) => {
                let job = self.complete(job).await?;
                tracing::info!(job_id = %job_id, attempt = job.attempt + 1, "Conversion job succeeded");
                Ok(Some(job))
            }
            Ok(Err(e)) => {
                tracing::warn!(job_id = %job_id, error = %e, "Conversion attempt failed");
                let (job, outcome) = self.fail(job, &e).await?;
                Ok(matches!(outcome, FailureOutcome::Terminal).then_some(job))
            }
            Err(_) => {
                tracing::warn!(
                    job_id = %job_id,
                    timeout_secs = self.config.job_timeout.as_secs_f64(),
                    "Conversion attempt timed out"
                );
                let error = anyhow::anyhow!(
                    "attempt timed out after {:?}",
                    self.config.job_timeout
                );
                let (job, outcome) = self.fail(job, &error).await?;
                Ok(matches!(outcome, FailureOutcome::Terminal).then_some(job))
            }
        }
    }

    async fn reaper_loop(self) {
        let mut interval = tokio::time::interval(self.config.reap_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.reap_stale().await {
                        tracing::error!(error = %e, "Stale claim reaper failed");
                    }
                }
                _ = self.shutdown.cancelled() => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mediaconv_core::{JobStatus, TaskError};
    use mediaconv_db::InMemoryJobStore;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicU32;
    use std::sync::Mutex;

    fn fast_config() -> JobQueueConfig {
        JobQueueConfig {
            max_workers: 4,
            poll_interval: Duration::from_millis(10),
            max_attempts: 3,
            retry_base_delay: Duration::from_millis(1),
            retry_max_backoff: Duration::from_millis(5),
            job_timeout: Duration::from_secs(5),
            visibility_timeout: Duration::from_secs(900),
            reap_interval: Duration::ZERO,
        }
    }

    /// Fails the first `failures` attempts per job, recording concurrency per media.
    struct ScriptedContext {
        failures: u32,
        unrecoverable: bool,
        delay: Duration,
        attempts: AtomicU32,
        in_flight: Mutex<HashMap<Uuid, usize>>,
        max_in_flight_per_media: AtomicUsize,
    }

    impl ScriptedContext {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                unrecoverable: false,
                delay: Duration::ZERO,
                attempts: AtomicU32::new(0),
                in_flight: Mutex::new(HashMap::new()),
                max_in_flight_per_media: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl JobHandlerContext for ScriptedContext {
        async fn dispatch_job(self: Arc<Self>, job: &ConversionJob) -> Result<()> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            {
                let mut in_flight = self.in_flight.lock().unwrap();
                let running = in_flight.entry(job.media_id).or_insert(0);
                *running += 1;
                self.max_in_flight_per_media
                    .fetch_max(*running, Ordering::SeqCst);
            }

            if !self.delay.is_zero() {
                sleep(self.delay).await;
            }

            *self.in_flight.lock().unwrap().get_mut(&job.media_id).unwrap() -= 1;

            if self.unrecoverable {
                return Err(TaskError::unrecoverable(anyhow::anyhow!("media missing")).into());
            }
            if attempt < self.failures {
                anyhow::bail!("transient failure {}", attempt);
            }
            Ok(())
        }
    }

    async fn run_until_finished(
        config: JobQueueConfig,
        ctx: Arc<ScriptedContext>,
        jobs: usize,
    ) -> (JobQueue, Vec<ConversionJob>) {
        let queue = JobQueue::new(Arc::new(InMemoryJobStore::new()), config);
        let (tx, mut rx) = mpsc::channel(16);
        let weak: Weak<dyn JobHandlerContext> = Arc::downgrade(&ctx) as Weak<dyn JobHandlerContext>;
        queue.start_workers(weak, Some(tx));

        let media_id = Uuid::new_v4();
        for _ in 0..jobs {
            queue.enqueue(media_id).await.unwrap();
        }

        let mut finished = Vec::new();
        for _ in 0..jobs {
            let job = tokio::time::timeout(Duration::from_secs(10), rx.recv())
                .await
                .expect("job did not finish in time")
                .expect("finished channel closed");
            finished.push(job);
        }
        (queue, finished)
    }

    #[test]
    fn retry_backoff_exponential_then_capped() {
        let base = Duration::from_millis(100);
        let max = Duration::from_secs(1);
        assert_eq!(compute_retry_backoff(1, base, max), Duration::from_millis(100));
        assert_eq!(compute_retry_backoff(2, base, max), Duration::from_millis(200));
        assert_eq!(compute_retry_backoff(3, base, max), Duration::from_millis(400));
        assert_eq!(compute_retry_backoff(5, base, max), Duration::from_secs(1));
        assert_eq!(compute_retry_backoff(200, base, max), Duration::from_secs(1));
    }

    #[test]
    fn jitter_stays_within_one_delay() {
        let delay = Duration::from_millis(50);
        for _ in 0..100 {
            let jittered = with_jitter(delay);
            assert!(jittered >= delay);
            assert!(jittered <= delay * 2);
        }
        assert_eq!(with_jitter(Duration::ZERO), Duration::ZERO);
    }

    #[tokio::test]
    async fn transient_failures_then_success() {
        let ctx = Arc::new(ScriptedContext::new(2));
        let (queue, finished) = run_until_finished(fast_config(), ctx.clone(), 1).await;

        assert_eq!(finished[0].status, JobStatus::Succeeded);
        assert_eq!(finished[0].attempt, 2);
        assert_eq!(ctx.attempts.load(Ordering::SeqCst), 3);
        assert_eq!(queue.outstanding().await.unwrap(), 0);
        queue.shutdown();
    }

    #[tokio::test]
    async fn exhausted_attempts_end_terminal() {
        let ctx = Arc::new(ScriptedContext::new(u32::MAX));
        let (queue, finished) = run_until_finished(fast_config(), ctx.clone(), 1).await;

        assert_eq!(finished[0].status, JobStatus::FailedTerminal);
        assert_eq!(finished[0].attempt, 3);
        assert!(finished[0].last_error.as_deref().unwrap().contains("transient failure 2"));
        assert_eq!(ctx.attempts.load(Ordering::SeqCst), 3);
        queue.shutdown();
    }

    #[tokio::test]
    async fn unrecoverable_error_is_not_retried() {
        let mut scripted = ScriptedContext::new(0);
        scripted.unrecoverable = true;
        let ctx = Arc::new(scripted);
        let (queue, finished) = run_until_finished(fast_config(), ctx.clone(), 1).await;

        assert_eq!(finished[0].status, JobStatus::FailedTerminal);
        assert_eq!(finished[0].attempt, 1);
        assert_eq!(ctx.attempts.load(Ordering::SeqCst), 1);
        queue.shutdown();
    }

    #[tokio::test]
    async fn timed_out_attempt_is_retried() {
        let mut scripted = ScriptedContext::new(0);
        scripted.delay = Duration::from_millis(200);
        let ctx = Arc::new(scripted);
        let config = JobQueueConfig {
            job_timeout: Duration::from_millis(20),
            ..fast_config()
        };
        let (queue, finished) = run_until_finished(config, ctx.clone(), 1).await;

        assert_eq!(finished[0].status, JobStatus::FailedTerminal);
        assert_eq!(finished[0].attempt, 3);
        assert!(finished[0].last_error.as_deref().unwrap().contains("timed out"));
        queue.shutdown();
    }

    #[tokio::test]
    async fn jobs_for_same_media_never_overlap() {
        let mut scripted = ScriptedContext::new(0);
        scripted.delay = Duration::from_millis(20);
        let ctx = Arc::new(scripted);
        let (queue, finished) = run_until_finished(fast_config(), ctx.clone(), 3).await;

        assert!(finished.iter().all(|job| job.status == JobStatus::Succeeded));
        assert_eq!(ctx.max_in_flight_per_media.load(Ordering::SeqCst), 1);
        queue.shutdown();
    }

    #[tokio::test]
    async fn dequeue_returns_none_after_shutdown() {
        let queue = JobQueue::new(Arc::new(InMemoryJobStore::new()), fast_config());
        queue.shutdown();
        assert!(queue.dequeue().await.is_none());
    }

    #[tokio::test]
    async fn manual_dequeue_fail_and_complete() {
        let queue = JobQueue::new(Arc::new(InMemoryJobStore::new()), fast_config());
        let enqueued = queue.enqueue(Uuid::new_v4()).await.unwrap();

        let claimed = queue.dequeue().await.unwrap();
        assert_eq!(claimed.id, enqueued.id);
        assert_eq!(claimed.status, JobStatus::Running);

        let (failed, outcome) = queue
            .fail(claimed, &anyhow::anyhow!("decoder hiccup"))
            .await
            .unwrap();
        assert!(matches!(outcome, FailureOutcome::Retry { .. }));
        assert_eq!(failed.attempt, 1);

        let reclaimed = queue.dequeue().await.unwrap();
        assert_eq!(reclaimed.attempt, 1);
        let done = queue.complete(reclaimed).await.unwrap();
        assert_eq!(done.status, JobStatus::Succeeded);
        assert_eq!(queue.outstanding().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn reaper_hands_back_abandoned_claims() {
        let config = JobQueueConfig {
            visibility_timeout: Duration::ZERO,
            ..fast_config()
        };
        let queue = JobQueue::new(Arc::new(InMemoryJobStore::new()), config);
        queue.enqueue(Uuid::new_v4()).await.unwrap();

        let abandoned = queue.dequeue().await.unwrap();
        sleep(Duration::from_millis(5)).await;
        assert_eq!(queue.reap_stale().await.unwrap(), 1);

        let redelivered = queue.dequeue().await.unwrap();
        assert_eq!(redelivered.id, abandoned.id);
        assert_eq!(redelivered.attempt, 0);

        let err = queue.complete(abandoned).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::ClaimLost(_))
        ));
    }

    #[tokio::test]
    async fn live_workers_tracks_pool() {
        let ctx = Arc::new(ScriptedContext::new(0));
        let queue = JobQueue::new(Arc::new(InMemoryJobStore::new()), fast_config());
        let weak: Weak<dyn JobHandlerContext> = Arc::downgrade(&ctx) as Weak<dyn JobHandlerContext>;
        queue.start_workers(weak, None);

        for _ in 0..50 {
            if queue.live_workers() == 4 {
                break;
            }
            sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(queue.live_workers(), 4);

        queue.shutdown();
        for _ in 0..50 {
            if queue.live_workers() == 0 {
                break;
            }
            sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(queue.live_workers(), 0);
    }

    #[tokio::test]
    async fn closed_finished_receiver_does_not_stop_workers() {
        let ctx = Arc::new(ScriptedContext::new(0));
        let queue = JobQueue::new(Arc::new(InMemoryJobStore::new()), fast_config());
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let weak: Weak<dyn JobHandlerContext> = Arc::downgrade(&ctx) as Weak<dyn JobHandlerContext>;
        queue.start_workers(weak, Some(tx));

        for _ in 0..3 {
            queue.enqueue(Uuid::new_v4()).await.unwrap();
        }
        for _ in 0..200 {
            let drained = ctx.attempts.load(Ordering::SeqCst) == 3
                && queue.outstanding().await.unwrap() == 0;
            if drained && queue.live_workers() == 4 {
                break;
            }
            sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(queue.outstanding().await.unwrap(), 0);
        assert_eq!(queue.live_workers(), 4);
        queue.shutdown();
    }
}
