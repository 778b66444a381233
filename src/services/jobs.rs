//! Asynchronous batch job lifecycle.
//!
//! A multi-entry move, copy or delete is queued with the provider, which
//! answers either with the final result or with an async job id. In the
//! latter case a background task polls the kind-specific check endpoint until
//! the job reaches a terminal state. Browsers only ever see the local job id
//! handed out by [`JobTracker::start`].

use crate::config::AppConfig;
use crate::services::dropbox::{
    ApiError, BatchEntryResult, BatchKind, BatchLaunch, BatchRequest, FileStorageApi, JobStatus,
};
use crate::utils::token_fingerprint;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;
use uuid::Uuid;

/// Check failures in a row after which a job is abandoned
const MAX_CONSECUTIVE_ERRORS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    InProgress,
    Complete,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobState::InProgress)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JobSnapshot {
    pub job_id: String,
    pub operation: BatchKind,
    pub status: JobState,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

struct JobRecord {
    owner: String,
    snapshot: JobSnapshot,
}

pub struct JobTracker {
    api: Arc<dyn FileStorageApi>,
    jobs: DashMap<String, JobRecord>,
    poll_interval: Duration,
    max_polls: u32,
    retention: chrono::Duration,
}

impl JobTracker {
    pub fn new(api: Arc<dyn FileStorageApi>, config: &AppConfig) -> Self {
        Self {
            api,
            jobs: DashMap::new(),
            poll_interval: Duration::from_millis(config.job_poll_interval_ms),
            max_polls: config.job_max_polls,
            retention: i64::try_from(config.job_retention_secs)
                .ok()
                .and_then(chrono::Duration::try_seconds)
                .unwrap_or(chrono::Duration::MAX),
        }
    }

    /// Queue a batch operation with the provider and start tracking it
    pub async fn start(
        self: &Arc<Self>,
        access_token: &str,
        request: BatchRequest,
    ) -> Result<JobSnapshot, ApiError> {
        let kind = request.kind();
        let total = request.len();

        tracing::info!("📦 Launching batch {} of {} entries", kind.as_str(), total);
        let launch = self.api.launch_batch(access_token, &request).await?;

        let now = Utc::now();
        let mut snapshot = JobSnapshot {
            job_id: Uuid::new_v4().to_string(),
            operation: kind,
            status: JobState::InProgress,
            total,
            succeeded: 0,
            failed: 0,
            message: format!("{} selected entries", kind.progressive()),
            created_at: now,
            updated_at: now,
        };

        match launch {
            BatchLaunch::Complete { entries } => {
                complete(&mut snapshot, &entries);
                tracing::info!("✅ Batch {} finished immediately", kind.as_str());
                self.insert(access_token, snapshot.clone());
            }
            BatchLaunch::AsyncJobId { async_job_id } => {
                tracing::info!(
                    "⏳ Batch {} underway: job {} (provider job {})",
                    kind.as_str(),
                    snapshot.job_id,
                    async_job_id
                );
                self.insert(access_token, snapshot.clone());

                let tracker = Arc::clone(self);
                let job_id = snapshot.job_id.clone();
                let access_token = access_token.to_string();
                tokio::spawn(async move {
                    tracker.poll(job_id, kind, access_token, async_job_id).await;
                });
            }
            BatchLaunch::Other => {
                return Err(ApiError::Decode(format!(
                    "unrecognised answer when starting batch {}",
                    kind.as_str()
                )));
            }
        }

        Ok(snapshot)
    }

    /// Current state of a job, visible only to the token that started it
    pub fn status(&self, job_id: &str, access_token: &str) -> Option<JobSnapshot> {
        let owner = token_fingerprint(access_token);
        self.jobs
            .get(job_id)
            .filter(|record| record.owner == owner)
            .map(|record| record.snapshot.clone())
    }

    /// Drop finished jobs whose last update is older than the retention window
    pub fn prune(&self, now: DateTime<Utc>) -> usize {
        let before = self.jobs.len();
        let retention = self.retention;
        self.jobs.retain(|_, record| {
            !record.snapshot.status.is_terminal()
                || record
                    .snapshot
                    .updated_at
                    .checked_add_signed(retention)
                    .is_none_or(|expiry| expiry > now)
        });
        before.saturating_sub(self.jobs.len())
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    fn insert(&self, access_token: &str, snapshot: JobSnapshot) {
        self.jobs.insert(
            snapshot.job_id.clone(),
            JobRecord {
                owner: token_fingerprint(access_token),
                snapshot,
            },
        );
    }

    fn update(&self, job_id: &str, apply: impl FnOnce(&mut JobSnapshot)) {
        if let Some(mut record) = self.jobs.get_mut(job_id) {
            apply(&mut record.snapshot);
            record.snapshot.updated_at = Utc::now();
        }
    }

    fn fail(&self, job_id: &str, message: String) {
        tracing::error!("❌ Batch job {} failed: {}", job_id, message);
        self.update(job_id, |snapshot| {
            snapshot.status = JobState::Failed;
            snapshot.message = message;
        });
    }

    async fn poll(
        self: Arc<Self>,
        job_id: String,
        kind: BatchKind,
        access_token: String,
        async_job_id: String,
    ) {
        let mut consecutive_errors = 0;

        for attempt in 1..=self.max_polls {
            tokio::time::sleep(self.poll_interval).await;

            match self
                .api
                .check_batch(&access_token, kind, &async_job_id)
                .await
            {
                Ok(JobStatus::InProgress) => {
                    consecutive_errors = 0;
                    tracing::debug!("Batch job {} still in progress (check {})", job_id, attempt);
                }
                Ok(JobStatus::Complete { entries }) => {
                    self.update(&job_id, |snapshot| complete(snapshot, &entries));
                    tracing::info!("✅ Batch {} job {} complete", kind.as_str(), job_id);
                    return;
                }
                Ok(JobStatus::Failed { failed }) => {
                    let reason = failed[".tag"].as_str().unwrap_or("unknown reason");
                    self.fail(
                        &job_id,
                        format!("Batch {} failed: {}", kind.as_str(), reason),
                    );
                    return;
                }
                Ok(JobStatus::Other) => {
                    self.fail(
                        &job_id,
                        format!("Batch {} returned an unknown status", kind.as_str()),
                    );
                    return;
                }
                Err(e) => {
                    consecutive_errors += 1;
                    tracing::warn!(
                        "Checking batch job {} failed ({}/{}): {}",
                        job_id,
                        consecutive_errors,
                        MAX_CONSECUTIVE_ERRORS,
                        e
                    );
                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        self.fail(&job_id, format!("Batch {} failed: {}", kind.as_str(), e));
                        return;
                    }
                }
            }
        }

        self.fail(&job_id, format!("Batch {} timed out", kind.as_str()));
    }
}

/// Fold per-entry results into a terminal snapshot
fn complete(snapshot: &mut JobSnapshot, entries: &[BatchEntryResult]) {
    // Some providers report completion without per-entry results
    let (succeeded, total) = if entries.is_empty() {
        (snapshot.total, snapshot.total)
    } else {
        let succeeded = entries
            .iter()
            .filter(|e| **e == BatchEntryResult::Success)
            .count();
        (succeeded, entries.len())
    };

    let verb = snapshot.operation.past_tense();
    snapshot.succeeded = succeeded;
    snapshot.failed = total - succeeded;
    if succeeded == total {
        snapshot.status = JobState::Complete;
        snapshot.message = format!("{} selected entries", verb);
    } else {
        snapshot.status = if succeeded == 0 {
            JobState::Failed
        } else {
            JobState::Complete
        };
        snapshot.message = format!("{} {} of {} selected entries", verb, succeeded, total);
    }
}
