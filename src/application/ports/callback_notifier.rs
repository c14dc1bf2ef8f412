use async_trait::async_trait;

use crate::domain::OutcomeNotification;

use super::Retryable;

#[async_trait]
pub trait CallbackNotifier: Send + Sync {
    async fn notify(
        &self,
        callback_url: &str,
        notification: &OutcomeNotification,
    ) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NotificationError {
    #[error("callback timed out: {0}")]
    Timeout(String),
    #[error("callback request failed: {0}")]
    Transport(String),
    #[error("callback endpoint returned HTTP {status}")]
    Rejected { status: u16 },
}

impl Retryable for NotificationError {
    fn is_retryable(&self) -> bool {
        match self {
            NotificationError::Timeout(_) | NotificationError::Transport(_) => true,
            NotificationError::Rejected { status } => *status >= 500 || *status == 429,
        }
    }
}
