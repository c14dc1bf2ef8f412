#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("query failed: {0}")]
    QueryFailed(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("version conflict on {id}: expected version {expected}")]
    VersionConflict { id: String, expected: i64 },
}

impl super::Retryable for RepositoryError {
    fn is_retryable(&self) -> bool {
        matches!(self, RepositoryError::ConnectionFailed(_))
    }
}
