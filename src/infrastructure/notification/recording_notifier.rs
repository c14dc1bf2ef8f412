use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::ports::{CallbackNotifier, NotificationError};
use crate::domain::OutcomeNotification;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedNotification {
    pub callback_url: String,
    pub notification: OutcomeNotification,
}

/// Callback notifier that records every attempt. The first `failures` attempts
/// fail with `error`; later ones succeed.
pub struct RecordingCallbackNotifier {
    attempts: Mutex<Vec<RecordedNotification>>,
    failures: Mutex<usize>,
    error: NotificationError,
}

impl RecordingCallbackNotifier {
    pub fn new() -> Self {
        Self::failing_times(0, NotificationError::Rejected { status: 500 })
    }

    pub fn failing_times(failures: usize, error: NotificationError) -> Self {
        Self {
            attempts: Mutex::new(Vec::new()),
            failures: Mutex::new(failures),
            error,
        }
    }

    /// Every attempt, successful or not.
    pub async fn attempts(&self) -> Vec<RecordedNotification> {
        self.attempts.lock().await.clone()
    }
}

impl Default for RecordingCallbackNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CallbackNotifier for RecordingCallbackNotifier {
    async fn notify(
        &self,
        callback_url: &str,
        notification: &OutcomeNotification,
    ) -> Result<(), NotificationError> {
        self.attempts.lock().await.push(RecordedNotification {
            callback_url: callback_url.to_string(),
            notification: notification.clone(),
        });

        let mut failures = self.failures.lock().await;
        if *failures > 0 {
            *failures -= 1;
            return Err(self.error.clone());
        }
        Ok(())
    }
}
