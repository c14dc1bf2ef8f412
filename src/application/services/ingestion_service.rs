use std::sync::Arc;

use reqwest::Url;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::application::ports::{DocumentLookup, JobRepository, RepositoryError};
use crate::domain::{DocumentId, Job, JobId, JobPatch, JobStateError, JobStatus, UserId};

use super::IngestionMessage;

#[derive(Debug, Clone)]
pub struct CreateJobRequest {
    pub document_id: DocumentId,
    pub job_type: String,
    pub callback_url: String,
}

/// Synchronous side of the ingestion subsystem: validates and persists jobs and
/// hands them to the worker queue. Driving a job happens in [`JobDriver`](super::JobDriver).
pub struct IngestionService {
    job_repository: Arc<dyn JobRepository>,
    document_lookup: Arc<dyn DocumentLookup>,
    sender: mpsc::Sender<IngestionMessage>,
}

impl IngestionService {
    pub fn new(
        job_repository: Arc<dyn JobRepository>,
        document_lookup: Arc<dyn DocumentLookup>,
        sender: mpsc::Sender<IngestionMessage>,
    ) -> Self {
        Self {
            job_repository,
            document_lookup,
            sender,
        }
    }

    #[tracing::instrument(skip(self, request), fields(document_id = %request.document_id.as_uuid(), job_type = %request.job_type))]
    pub async fn create(
        &self,
        request: CreateJobRequest,
        principal: UserId,
    ) -> Result<Job, IngestionError> {
        validate_job_type(&request.job_type)?;
        validate_callback_url(&request.callback_url)?;

        if self
            .document_lookup
            .resolve(request.document_id)
            .await?
            .is_none()
        {
            return Err(IngestionError::NotFound(format!(
                "Document with ID {} not found",
                request.document_id.as_uuid()
            )));
        }

        let job = Job::new(
            request.document_id,
            request.job_type,
            request.callback_url,
            principal,
        );
        self.job_repository.insert(&job).await?;

        if let Err(e) = self.sender.try_send(IngestionMessage { job_id: job.id }) {
            let reason = match e {
                TrySendError::Full(_) => "queue full",
                TrySendError::Closed(_) => "worker unavailable",
            };
            tracing::error!(job_id = %job.id.as_uuid(), reason, "Failed to enqueue ingestion job");
            if let Err(rollback) = self.job_repository.delete(job.id).await {
                tracing::error!(error = %rollback, "Failed to roll back unqueued job");
            }
            return Err(IngestionError::QueueUnavailable(reason.to_string()));
        }

        tracing::info!(job_id = %job.id.as_uuid(), "Ingestion job enqueued");
        Ok(job)
    }

    pub async fn get(&self, id: JobId) -> Result<Job, IngestionError> {
        self.job_repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| job_not_found(id))
    }

    pub async fn list_all(&self) -> Result<Vec<Job>, IngestionError> {
        Ok(self.job_repository.list_all().await?)
    }

    #[tracing::instrument(skip(self, patch), fields(job_id = %id.as_uuid()))]
    pub async fn update(&self, id: JobId, patch: JobPatch) -> Result<Job, IngestionError> {
        if let Some(job_type) = &patch.job_type {
            validate_job_type(job_type)?;
        }
        if let Some(callback_url) = &patch.callback_url {
            validate_callback_url(callback_url)?;
        }

        let mut job = self.get(id).await?;

        if let Some(expected) = patch.expected_version {
            if expected != job.version {
                return Err(IngestionError::Conflict(format!(
                    "Ingestion job {} is at version {}, not {}",
                    id.as_uuid(),
                    job.version,
                    expected
                )));
            }
        }

        if patch.is_empty() && !job.is_terminal() {
            return Ok(job);
        }

        job.apply_patch(&patch)
            .map_err(|e| IngestionError::InvalidState(e.to_string()))?;

        match self.job_repository.save(&job).await {
            Ok(saved) => Ok(saved),
            Err(RepositoryError::NotFound(_)) => Err(job_not_found(id)),
            Err(RepositoryError::VersionConflict { .. }) => {
                // Lost a race, most likely with the driver. Re-read to report accurately.
                match self.job_repository.get_by_id(id).await? {
                    Some(current) if current.is_terminal() => Err(IngestionError::InvalidState(
                        JobStateError::Terminal {
                            id,
                            status: current.status,
                        }
                        .to_string(),
                    )),
                    Some(current) => Err(IngestionError::Conflict(format!(
                        "Ingestion job {} changed concurrently (now version {})",
                        id.as_uuid(),
                        current.version
                    ))),
                    None => Err(job_not_found(id)),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    #[tracing::instrument(skip(self), fields(job_id = %id.as_uuid()))]
    pub async fn remove(&self, id: JobId) -> Result<(), IngestionError> {
        match self.job_repository.delete(id).await {
            Ok(()) => {
                tracing::info!("Ingestion job removed");
                Ok(())
            }
            Err(RepositoryError::NotFound(_)) => Err(job_not_found(id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Re-enqueues every job still `PENDING`, e.g. after a restart.
    pub async fn requeue_pending(&self) -> Result<usize, IngestionError> {
        let pending = self.job_repository.list_by_status(JobStatus::Pending).await?;
        let count = pending.len();

        for job in pending {
            self.sender
                .send(IngestionMessage { job_id: job.id })
                .await
                .map_err(|_| IngestionError::QueueUnavailable("worker unavailable".to_string()))?;
        }

        if count > 0 {
            tracing::info!(count, "Re-enqueued pending ingestion jobs");
        }
        Ok(count)
    }

    pub fn queue_capacity(&self) -> usize {
        self.sender.capacity()
    }
}

fn job_not_found(id: JobId) -> IngestionError {
    IngestionError::NotFound(format!("Ingestion job with ID {} not found", id.as_uuid()))
}

fn validate_job_type(job_type: &str) -> Result<(), IngestionError> {
    if job_type.trim().is_empty() {
        return Err(IngestionError::InvalidRequest(
            "type must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_callback_url(callback_url: &str) -> Result<(), IngestionError> {
    let url = Url::parse(callback_url).map_err(|e| {
        IngestionError::InvalidRequest(format!("callbackUrl is not a valid URL: {}", e))
    })?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(IngestionError::InvalidRequest(format!(
            "callbackUrl must use http or https, got {}",
            other
        ))),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    Conflict(String),
    #[error("ingestion queue unavailable: {0}")]
    QueueUnavailable(String),
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
}
