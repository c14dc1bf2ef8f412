use crate::domain::{Job, JobId, JobStatus, OutboxEntry};
use async_trait::async_trait;

use super::RepositoryError;

/// Persistence for ingestion jobs.
///
/// Every mutation touches a single row atomically. Removed jobs are tombstoned:
/// they disappear from reads, and later conditional writes against them are no-ops.
#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn insert(&self, job: &Job) -> Result<JobId, RepositoryError>;

    async fn get_by_id(&self, id: JobId) -> Result<Option<Job>, RepositoryError>;

    async fn list_all(&self) -> Result<Vec<Job>, RepositoryError>;

    async fn list_by_status(&self, status: JobStatus) -> Result<Vec<Job>, RepositoryError>;

    /// Compare-and-swap on `job.version`. Returns the stored job with its new version.
    async fn save(&self, job: &Job) -> Result<Job, RepositoryError>;

    /// Moves `id` from `from` to `to` only if it is currently `from` and not removed.
    /// Returns whether the transition was applied.
    async fn transition(
        &self,
        id: JobId,
        from: JobStatus,
        to: JobStatus,
        error_message: Option<&str>,
    ) -> Result<bool, RepositoryError>;

    /// Settles a `PROCESSING` job into the status carried by `entry.notification`
    /// and records the outbox entry in the same transaction.
    ///
    /// The recorded entry targets the callback URL stored on the row at settle
    /// time, so an update made while processing is honoured. Returns the entry as
    /// recorded, or `None` without writing anything if the job is no longer
    /// `PROCESSING`.
    async fn settle(
        &self,
        id: JobId,
        entry: &OutboxEntry,
    ) -> Result<Option<OutboxEntry>, RepositoryError>;

    async fn delete(&self, id: JobId) -> Result<(), RepositoryError>;
}
