use std::sync::Arc;

use chrono::Utc;

use crate::application::ports::{CallbackNotifier, NotificationOutbox};
use crate::domain::OutboxEntry;
use crate::infrastructure::observability::sanitize_url;

use super::RetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Rescheduled,
    Abandoned,
}

/// Delivers one outbox entry and records the result on it.
///
/// One call is one delivery round: up to `retry_policy.max_attempts()` HTTP
/// attempts. After `max_rounds` failed rounds the entry is abandoned.
pub struct NotificationDelivery {
    notifier: Arc<dyn CallbackNotifier>,
    outbox: Arc<dyn NotificationOutbox>,
    retry_policy: RetryPolicy,
    max_rounds: u32,
}

impl NotificationDelivery {
    pub fn new(
        notifier: Arc<dyn CallbackNotifier>,
        outbox: Arc<dyn NotificationOutbox>,
        retry_policy: RetryPolicy,
        max_rounds: u32,
    ) -> Self {
        Self {
            notifier,
            outbox,
            retry_policy,
            max_rounds: max_rounds.max(1),
        }
    }

    pub async fn deliver(&self, entry: &OutboxEntry) -> DeliveryOutcome {
        let notifier = &self.notifier;
        let url = entry.callback_url.as_str();
        let notification = &entry.notification;

        let result = self
            .retry_policy
            .run("callback", move || notifier.notify(url, notification))
            .await;

        match result {
            Ok(()) => {
                tracing::info!(
                    job_id = %entry.job_id.as_uuid(),
                    callback_url = %sanitize_url(url),
                    status = %notification.status,
                    "Outcome notification delivered"
                );
                if let Err(e) = self.outbox.mark_delivered(entry.id).await {
                    tracing::error!(error = %e, "Failed to mark notification delivered");
                }
                DeliveryOutcome::Delivered
            }
            Err(e) => {
                let rounds = u32::try_from(entry.attempts).unwrap_or(0).saturating_add(1);
                let abandon = rounds >= self.max_rounds;
                let delay = self.retry_policy.backoff_for(rounds);
                let next_attempt_at = Utc::now()
                    + chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::zero());

                tracing::warn!(
                    job_id = %entry.job_id.as_uuid(),
                    callback_url = %sanitize_url(url),
                    error = %e,
                    rounds,
                    abandon,
                    "Outcome notification failed"
                );

                if let Err(record_err) = self
                    .outbox
                    .record_failure(entry.id, &e.to_string(), next_attempt_at, abandon)
                    .await
                {
                    tracing::error!(error = %record_err, "Failed to record notification failure");
                }

                if abandon {
                    DeliveryOutcome::Abandoned
                } else {
                    DeliveryOutcome::Rescheduled
                }
            }
        }
    }
}
