use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{DocumentId, JobId};

use super::Retryable;

/// Remote processing service. Returns the service's result payload verbatim.
#[async_trait]
pub trait ProcessingClient: Send + Sync {
    async fn process(
        &self,
        job_id: JobId,
        document_id: DocumentId,
        job_type: &str,
    ) -> Result<Value, ProcessingError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProcessingError {
    #[error("processing request timed out: {0}")]
    Timeout(String),
    #[error("processing request failed: {0}")]
    Transport(String),
    #[error("processing service returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("invalid processing response: {0}")]
    InvalidResponse(String),
}

impl Retryable for ProcessingError {
    fn is_retryable(&self) -> bool {
        match self {
            ProcessingError::Timeout(_) | ProcessingError::Transport(_) => true,
            ProcessingError::Rejected { status, .. } => *status >= 500 || *status == 429,
            ProcessingError::InvalidResponse(_) => false,
        }
    }
}
