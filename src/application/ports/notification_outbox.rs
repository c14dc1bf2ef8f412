use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{JobId, OutboxEntry, OutboxEntryId};

use super::RepositoryError;

/// Read and bookkeeping side of the notification outbox. Entries are written by
/// [`JobRepository::settle`](super::JobRepository::settle).
#[async_trait]
pub trait NotificationOutbox: Send + Sync {
    /// Claims up to `limit` undelivered, non-abandoned entries whose next attempt
    /// is due, oldest first. Claimed entries are pushed to `now + lease`, so a
    /// concurrent relay skips them until the claimant records an outcome or the
    /// lease runs out.
    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        lease: Duration,
        limit: usize,
    ) -> Result<Vec<OutboxEntry>, RepositoryError>;

    async fn mark_delivered(&self, id: OutboxEntryId) -> Result<(), RepositoryError>;

    /// Counts one failed delivery round. `abandon` stops any further relay attempts.
    async fn record_failure(
        &self,
        id: OutboxEntryId,
        error: &str,
        next_attempt_at: DateTime<Utc>,
        abandon: bool,
    ) -> Result<(), RepositoryError>;

    async fn list_for_job(&self, job_id: JobId) -> Result<Vec<OutboxEntry>, RepositoryError>;
}
