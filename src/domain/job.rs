use chrono::{DateTime, Utc};

use super::{DocumentId, JobId, JobPatch, JobStatus, UserId};

/// An ingestion job and its lifecycle state.
///
/// `version` starts at 1 and is bumped by every persisted mutation. Stores use it
/// as a compare-and-swap token so a stale write is rejected instead of lost.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: JobId,
    pub document_id: DocumentId,
    pub job_type: String,
    pub status: JobStatus,
    pub callback_url: String,
    pub error_message: Option<String>,
    pub created_by: UserId,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(
        document_id: DocumentId,
        job_type: String,
        callback_url: String,
        created_by: UserId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            document_id,
            job_type,
            status: JobStatus::Pending,
            callback_url,
            error_message: None,
            created_by,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Applies caller-editable fields. Status is never part of a patch.
    pub fn apply_patch(&mut self, patch: &JobPatch) -> Result<(), JobStateError> {
        if self.is_terminal() {
            return Err(JobStateError::Terminal {
                id: self.id,
                status: self.status,
            });
        }

        if let Some(job_type) = &patch.job_type {
            self.job_type = job_type.clone();
        }
        if let Some(callback_url) = &patch.callback_url {
            self.callback_url = callback_url.clone();
        }
        self.updated_at = Utc::now();

        Ok(())
    }

    /// Moves the job along its lifecycle. `error` is kept only for `FAILED`.
    pub fn transition_to(
        &mut self,
        next: JobStatus,
        error: Option<&str>,
    ) -> Result<(), JobStateError> {
        if !self.status.can_transition_to(next) {
            return Err(JobStateError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        self.status = next;
        self.error_message = match next {
            JobStatus::Failed => Some(error.unwrap_or("unknown failure").to_string()),
            _ => None,
        };
        self.updated_at = Utc::now();

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JobStateError {
    #[error("job {} is {status} and can no longer be modified", .id.as_uuid())]
    Terminal { id: JobId, status: JobStatus },
    #[error("invalid status transition {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },
}
