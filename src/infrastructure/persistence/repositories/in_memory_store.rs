use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::application::ports::{
    DocumentLookup, JobRepository, NotificationOutbox, RepositoryError,
};
use crate::domain::{
    DocumentId, DocumentMetadata, Job, JobId, JobStatus, OutboxEntry, OutboxEntryId,
};

struct StoredJob {
    job: Job,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct State {
    jobs: HashMap<JobId, StoredJob>,
    outbox: Vec<OutboxEntry>,
}

/// Job store and notification outbox held in process memory.
///
/// Each operation runs under one write lock, which gives the same per-row
/// atomicity as the Postgres store. Used for tests and local runs without a database.
#[derive(Default)]
pub struct InMemoryJobStore {
    state: RwLock<State>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows, tombstones included.
    pub async fn row_count(&self) -> usize {
        self.state.read().await.jobs.len()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobStore {
    async fn insert(&self, job: &Job) -> Result<JobId, RepositoryError> {
        let mut state = self.state.write().await;
        if state.jobs.contains_key(&job.id) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "ingestion job {} already exists",
                job.id.as_uuid()
            )));
        }
        state.jobs.insert(
            job.id,
            StoredJob {
                job: job.clone(),
                deleted_at: None,
            },
        );
        Ok(job.id)
    }

    async fn get_by_id(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .jobs
            .get(&id)
            .filter(|s| s.deleted_at.is_none())
            .map(|s| s.job.clone()))
    }

    async fn list_all(&self) -> Result<Vec<Job>, RepositoryError> {
        let state = self.state.read().await;
        let mut jobs: Vec<Job> = state
            .jobs
            .values()
            .filter(|s| s.deleted_at.is_none())
            .map(|s| s.job.clone())
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    async fn list_by_status(&self, status: JobStatus) -> Result<Vec<Job>, RepositoryError> {
        let state = self.state.read().await;
        let mut jobs: Vec<Job> = state
            .jobs
            .values()
            .filter(|s| s.deleted_at.is_none() && s.job.status == status)
            .map(|s| s.job.clone())
            .collect();
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(jobs)
    }

    async fn save(&self, job: &Job) -> Result<Job, RepositoryError> {
        let mut state = self.state.write().await;
        let stored = state
            .jobs
            .get_mut(&job.id)
            .filter(|s| s.deleted_at.is_none())
            .ok_or_else(|| RepositoryError::NotFound(job.id.as_uuid().to_string()))?;

        if stored.job.version != job.version {
            return Err(RepositoryError::VersionConflict {
                id: job.id.as_uuid().to_string(),
                expected: job.version,
            });
        }

        stored.job.job_type = job.job_type.clone();
        stored.job.callback_url = job.callback_url.clone();
        stored.job.version += 1;
        stored.job.updated_at = Utc::now();
        Ok(stored.job.clone())
    }

    async fn transition(
        &self,
        id: JobId,
        from: JobStatus,
        to: JobStatus,
        error_message: Option<&str>,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.state.write().await;
        let Some(stored) = state
            .jobs
            .get_mut(&id)
            .filter(|s| s.deleted_at.is_none() && s.job.status == from)
        else {
            return Ok(false);
        };

        if stored.job.transition_to(to, error_message).is_err() {
            return Ok(false);
        }
        stored.job.version += 1;
        Ok(true)
    }

    async fn settle(
        &self,
        id: JobId,
        entry: &OutboxEntry,
    ) -> Result<Option<OutboxEntry>, RepositoryError> {
        let mut state = self.state.write().await;
        let Some(stored) = state
            .jobs
            .get_mut(&id)
            .filter(|s| s.deleted_at.is_none() && s.job.status == JobStatus::Processing)
        else {
            return Ok(None);
        };

        let notification = &entry.notification;
        if stored
            .job
            .transition_to(notification.status, notification.error.as_deref())
            .is_err()
        {
            return Ok(None);
        }
        stored.job.version += 1;

        let recorded = OutboxEntry {
            callback_url: stored.job.callback_url.clone(),
            ..entry.clone()
        };
        state.outbox.push(recorded.clone());
        Ok(Some(recorded))
    }

    async fn delete(&self, id: JobId) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        let stored = state
            .jobs
            .get_mut(&id)
            .filter(|s| s.deleted_at.is_none())
            .ok_or_else(|| RepositoryError::NotFound(id.as_uuid().to_string()))?;

        let now = Utc::now();
        stored.deleted_at = Some(now);
        stored.job.version += 1;
        stored.job.updated_at = now;
        Ok(())
    }
}

#[async_trait]
impl NotificationOutbox for InMemoryJobStore {
    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        lease: Duration,
        limit: usize,
    ) -> Result<Vec<OutboxEntry>, RepositoryError> {
        let lease_until = now + chrono::Duration::from_std(lease).unwrap_or(chrono::Duration::zero());
        let mut state = self.state.write().await;

        let mut due: Vec<&mut OutboxEntry> = state
            .outbox
            .iter_mut()
            .filter(|e| !e.is_settled() && e.next_attempt_at <= now)
            .collect();
        due.sort_by_key(|e| e.next_attempt_at);
        due.truncate(limit);

        let mut claimed: Vec<OutboxEntry> = due
            .into_iter()
            .map(|e| {
                e.next_attempt_at = lease_until;
                e.clone()
            })
            .collect();
        claimed.sort_by_key(|e| e.created_at);
        Ok(claimed)
    }

    async fn mark_delivered(&self, id: OutboxEntryId) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        let entry = find_entry(&mut state.outbox, id)?;
        entry.attempts += 1;
        entry.last_error = None;
        entry.delivered_at = Some(Utc::now());
        Ok(())
    }

    async fn record_failure(
        &self,
        id: OutboxEntryId,
        error: &str,
        next_attempt_at: DateTime<Utc>,
        abandon: bool,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        let entry = find_entry(&mut state.outbox, id)?;
        entry.attempts += 1;
        entry.last_error = Some(error.to_string());
        entry.next_attempt_at = next_attempt_at;
        entry.abandoned_at = abandon.then(Utc::now);
        Ok(())
    }

    async fn list_for_job(&self, job_id: JobId) -> Result<Vec<OutboxEntry>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .outbox
            .iter()
            .filter(|e| e.job_id == job_id)
            .cloned()
            .collect())
    }
}

fn find_entry(
    outbox: &mut [OutboxEntry],
    id: OutboxEntryId,
) -> Result<&mut OutboxEntry, RepositoryError> {
    outbox
        .iter_mut()
        .find(|e| e.id == id)
        .ok_or_else(|| RepositoryError::NotFound(id.as_uuid().to_string()))
}

/// Document lookup over a fixed in-memory set of documents.
#[derive(Default)]
pub struct InMemoryDocumentLookup {
    documents: RwLock<HashMap<DocumentId, DocumentMetadata>>,
}

impl InMemoryDocumentLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, document: DocumentMetadata) {
        self.documents.write().await.insert(document.id, document);
    }

    pub async fn remove(&self, id: DocumentId) {
        self.documents.write().await.remove(&id);
    }
}

#[async_trait]
impl DocumentLookup for InMemoryDocumentLookup {
    async fn resolve(&self, id: DocumentId) -> Result<Option<DocumentMetadata>, RepositoryError> {
        Ok(self.documents.read().await.get(&id).cloned())
    }
}
