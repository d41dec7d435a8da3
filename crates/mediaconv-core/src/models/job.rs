use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    FailedRetryable,
    FailedTerminal,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::FailedRetryable => "failed_retryable",
            JobStatus::FailedTerminal => "failed_terminal",
        }
    }

    /// Statuses a worker may pick up once the job's `available_at` has passed.
    pub fn is_waiting(&self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::FailedRetryable)
    }
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "succeeded" => Ok(JobStatus::Succeeded),
            "failed_retryable" => Ok(JobStatus::FailedRetryable),
            "failed_terminal" => Ok(JobStatus::FailedTerminal),
            _ => Err(anyhow::anyhow!("Invalid job status: {}", s)),
        }
    }
}

/// What the queue must do with a job after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Becomes eligible again at the given instant.
    Retry { available_at: DateTime<Utc> },
    /// No further attempts.
    Terminal,
}

/// A unit of background work converting one media item's raw payload.
///
/// `attempt` counts failed executions so far. The media reference is weak: the job never
/// keeps the item alive and fails terminally if the item disappears.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConversionJob {
    pub id: Uuid,
    pub media_id: Uuid,
    pub status: JobStatus,
    pub attempt: u32,
    pub max_attempts: u32,
    pub available_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversionJob {
    pub fn new(media_id: Uuid, max_attempts: u32, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            media_id,
            status: JobStatus::Pending,
            attempt: 0,
            max_attempts,
            available_at: now,
            claimed_at: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_claimable(&self, now: DateTime<Utc>) -> bool {
        self.status.is_waiting() && self.available_at <= now
    }

    /// Pending/FailedRetryable -> Running
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.status = JobStatus::Running;
        self.claimed_at = Some(now);
        self.updated_at = now;
    }

    /// Running -> Succeeded
    pub fn succeed(&mut self, now: DateTime<Utc>) {
        self.status = JobStatus::Succeeded;
        self.claimed_at = None;
        self.updated_at = now;
    }

    /// Running -> FailedRetryable | FailedTerminal.
    ///
    /// Increments `attempt` first; `backoff` receives the new attempt number. A
    /// non-retryable error goes terminal whatever the remaining budget.
    pub fn record_failure(
        &mut self,
        error: impl Into<String>,
        retryable: bool,
        now: DateTime<Utc>,
        backoff: impl FnOnce(u32) -> Duration,
    ) -> FailureOutcome {
        self.attempt = self.attempt.saturating_add(1);
        self.last_error = Some(error.into());
        self.claimed_at = None;
        self.updated_at = now;

        if retryable && self.attempt < self.max_attempts {
            let available_at = now
                .checked_add_signed(backoff(self.attempt))
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            self.status = JobStatus::FailedRetryable;
            self.available_at = available_at;
            FailureOutcome::Retry { available_at }
        } else {
            self.status = JobStatus::FailedTerminal;
            FailureOutcome::Terminal
        }
    }

    /// Running -> Pending for a claim abandoned by its worker. Does not count as an attempt.
    pub fn release(&mut self, now: DateTime<Utc>) {
        self.status = JobStatus::Pending;
        self.claimed_at = None;
        self.available_at = now;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> ConversionJob {
        ConversionJob::new(Uuid::new_v4(), 3, Utc::now())
    }

    #[test]
    fn oversized_backoff_saturates_instead_of_overflowing() {
        let mut job = job();
        let now = Utc::now();
        job.start(now);

        let outcome = job.record_failure("boom", true, now, |_| Duration::MAX);
        assert_eq!(
            outcome,
            FailureOutcome::Retry {
                available_at: DateTime::<Utc>::MAX_UTC
            }
        );
        assert!(!job.is_claimable(now));
    }

    #[test]
    fn new_job_is_immediately_claimable() {
        let job = job();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.attempt, 0);
        assert!(job.is_claimable(Utc::now()));
    }

    #[test]
    fn running_job_is_not_claimable() {
        let mut job = job();
        job.start(Utc::now());
        assert!(!job.is_claimable(Utc::now() + Duration::hours(1)));
        assert!(job.claimed_at.is_some());
    }

    #[test]
    fn failures_retry_until_budget_exhausted() {
        let mut job = job();
        let now = Utc::now();

        job.start(now);
        let outcome = job.record_failure("boom", true, now, |attempt| {
            assert_eq!(attempt, 1);
            Duration::seconds(5)
        });
        assert_eq!(
            outcome,
            FailureOutcome::Retry {
                available_at: now + Duration::seconds(5)
            }
        );
        assert_eq!(job.status, JobStatus::FailedRetryable);
        assert!(!job.is_claimable(now));
        assert!(job.is_claimable(now + Duration::seconds(5)));

        job.start(now);
        job.record_failure("boom", true, now, |_| Duration::zero());
        assert_eq!(job.attempt, 2);
        assert_eq!(job.status, JobStatus::FailedRetryable);

        job.start(now);
        let outcome = job.record_failure("boom", true, now, |_| Duration::zero());
        assert_eq!(outcome, FailureOutcome::Terminal);
        assert_eq!(job.attempt, 3);
        assert_eq!(job.status, JobStatus::FailedTerminal);
        assert_eq!(job.last_error.as_deref(), Some("boom"));
    }

    #[test]
    fn non_retryable_failure_is_terminal_on_first_attempt() {
        let mut job = job();
        job.start(Utc::now());
        let outcome = job.record_failure("media gone", false, Utc::now(), |_| {
            panic!("backoff must not be computed for terminal failures")
        });
        assert_eq!(outcome, FailureOutcome::Terminal);
        assert_eq!(job.attempt, 1);
    }

    #[test]
    fn release_returns_job_to_pending_without_consuming_attempt() {
        let mut job = job();
        job.start(Utc::now());
        job.release(Utc::now());
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.attempt, 0);
        assert!(job.claimed_at.is_none());
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            JobStatus::Pending,
            JobStatus::Running,
            JobStatus::Succeeded,
            JobStatus::FailedRetryable,
            JobStatus::FailedTerminal,
        ] {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
    }
}
