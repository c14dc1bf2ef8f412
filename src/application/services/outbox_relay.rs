use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use futures::stream;

use crate::application::ports::{NotificationOutbox, RepositoryError};

use super::{DeliveryOutcome, NotificationDelivery};

const RELAY_CONCURRENCY: usize = 4;
const MIN_INTERVAL: Duration = Duration::from_millis(1);
const CLAIM_LEASE: Duration = Duration::from_secs(300);

/// Retries outcome notifications whose immediate delivery failed.
pub struct OutboxRelay {
    outbox: Arc<dyn NotificationOutbox>,
    delivery: Arc<NotificationDelivery>,
    interval: Duration,
    batch_size: usize,
}

impl OutboxRelay {
    pub fn new(
        outbox: Arc<dyn NotificationOutbox>,
        delivery: Arc<NotificationDelivery>,
        interval: Duration,
        batch_size: usize,
    ) -> Self {
        Self {
            outbox,
            delivery,
            interval: interval.max(MIN_INTERVAL),
            batch_size: batch_size.max(1),
        }
    }

    pub async fn run(self) {
        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            batch_size = self.batch_size,
            "Outbox relay started"
        );
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = self.relay_once().await {
                tracing::error!(error = %e, "Outbox relay pass failed");
            }
        }
    }

    /// Attempts every due entry once. Returns how many were delivered.
    pub async fn relay_once(&self) -> Result<usize, RepositoryError> {
        let due = self
            .outbox
            .claim_due(Utc::now(), CLAIM_LEASE, self.batch_size)
            .await?;
        if due.is_empty() {
            return Ok(0);
        }

        let due_count = due.len();
        let outcomes: Vec<DeliveryOutcome> = stream::iter(due)
            .map(|entry| {
                let delivery = Arc::clone(&self.delivery);
                async move { delivery.deliver(&entry).await }
            })
            .buffer_unordered(RELAY_CONCURRENCY)
            .collect()
            .await;

        let delivered = outcomes
            .iter()
            .filter(|o| **o == DeliveryOutcome::Delivered)
            .count();
        tracing::debug!(due = due_count, delivered, "Outbox relay pass finished");

        Ok(delivered)
    }
}
