use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{JobRepository, ProcessingClient, RepositoryError};
use crate::domain::{Job, JobId, JobStatus, OutboxEntry, OutcomeNotification};

use super::{NotificationDelivery, RetryPolicy};

pub const INTERRUPTED_MESSAGE: &str = "processing interrupted by service restart";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    Completed,
    Failed,
    /// The job was not `PENDING` when the drive started.
    Skipped,
    /// The job was removed while processing; its outcome was dropped.
    Removed,
}

/// Advances one job from `PENDING` to a terminal state.
pub struct JobDriver {
    job_repository: Arc<dyn JobRepository>,
    processing_client: Arc<dyn ProcessingClient>,
    delivery: Arc<NotificationDelivery>,
    processing_retry: RetryPolicy,
    relay_grace: Duration,
}

impl JobDriver {
    pub fn new(
        job_repository: Arc<dyn JobRepository>,
        processing_client: Arc<dyn ProcessingClient>,
        delivery: Arc<NotificationDelivery>,
        processing_retry: RetryPolicy,
        relay_grace: Duration,
    ) -> Self {
        Self {
            job_repository,
            processing_client,
            delivery,
            processing_retry,
            relay_grace,
        }
    }

    pub async fn drive(&self, job_id: JobId) -> Result<DriveOutcome, DriveError> {
        let started = self
            .job_repository
            .transition(job_id, JobStatus::Pending, JobStatus::Processing, None)
            .await?;
        if !started {
            tracing::debug!("Job is not pending, skipping");
            return Ok(DriveOutcome::Skipped);
        }
        tracing::debug!(status = %JobStatus::Processing, "Job status transition");

        let Some(job) = self.job_repository.get_by_id(job_id).await? else {
            tracing::info!("Job removed before processing started");
            return Ok(DriveOutcome::Removed);
        };

        let notification = match self.call_processing(&job).await {
            Ok(result) => OutcomeNotification::completed(job_id, result),
            Err(message) => {
                tracing::warn!(error = %message, "Processing failed");
                OutcomeNotification::failed(job_id, message)
            }
        };

        let entry = OutboxEntry::new(&job, notification, self.relay_grace);
        let status = entry.notification.status;

        let Some(recorded) = self.job_repository.settle(job_id, &entry).await? else {
            tracing::info!(
                status = %status,
                "Job removed while processing, outcome dropped"
            );
            return Ok(DriveOutcome::Removed);
        };
        tracing::debug!(status = %status, "Job status transition");

        self.delivery.deliver(&recorded).await;

        Ok(match status {
            JobStatus::Completed => DriveOutcome::Completed,
            _ => DriveOutcome::Failed,
        })
    }

    async fn call_processing(&self, job: &Job) -> Result<serde_json::Value, String> {
        let client = &self.processing_client;
        let job_id = job.id;
        let document_id = job.document_id;
        let job_type = job.job_type.as_str();

        tracing::debug!(job_type, "Calling processing service");

        self.processing_retry
            .run("processing", move || {
                client.process(job_id, document_id, job_type)
            })
            .await
            .map_err(|e| e.to_string())
    }

    /// Fails every job left `PROCESSING` by a previous run. Their notifications
    /// are left to the outbox relay.
    pub async fn fail_interrupted(&self) -> Result<usize, DriveError> {
        let interrupted = self
            .job_repository
            .list_by_status(JobStatus::Processing)
            .await?;

        let mut failed = 0;
        for job in interrupted {
            let notification = OutcomeNotification::failed(job.id, INTERRUPTED_MESSAGE.to_string());
            let entry = OutboxEntry::new(&job, notification, Duration::ZERO);
            if self.job_repository.settle(job.id, &entry).await?.is_some() {
                tracing::warn!(job_id = %job.id.as_uuid(), "Interrupted job marked failed");
                failed += 1;
            }
        }
        Ok(failed)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
}
