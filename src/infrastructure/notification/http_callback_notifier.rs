use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::application::ports::{CallbackNotifier, NotificationError};
use crate::domain::OutcomeNotification;

/// POSTs outcome notifications as JSON. Any 2xx response is an acknowledgement.
pub struct HttpCallbackNotifier {
    client: Client,
    timeout: Duration,
}

impl HttpCallbackNotifier {
    pub fn new(timeout: Duration) -> Result<Self, NotificationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotificationError::Transport(format!("client build failed: {e}")))?;

        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl CallbackNotifier for HttpCallbackNotifier {
    async fn notify(
        &self,
        callback_url: &str,
        notification: &OutcomeNotification,
    ) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(callback_url)
            .json(notification)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotificationError::Timeout(format!(
                        "no response within {}ms",
                        self.timeout.as_millis()
                    ))
                } else {
                    NotificationError::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(NotificationError::Rejected {
                status: response.status().as_u16(),
            });
        }

        Ok(())
    }
}
