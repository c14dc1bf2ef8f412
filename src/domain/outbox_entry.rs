use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Job, JobId, OutcomeNotification};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutboxEntryId(Uuid);

impl OutboxEntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for OutboxEntryId {
    fn default() -> Self {
        Self::new()
    }
}

/// Durable intent to deliver one outcome notification.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboxEntry {
    pub id: OutboxEntryId,
    pub job_id: JobId,
    pub callback_url: String,
    pub notification: OutcomeNotification,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub next_attempt_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub abandoned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl OutboxEntry {
    /// `relay_grace` delays the first relay pickup so the relay does not race
    /// the immediate delivery made by the driver.
    pub fn new(job: &Job, notification: OutcomeNotification, relay_grace: Duration) -> Self {
        let now = Utc::now();
        let grace = chrono::Duration::from_std(relay_grace).unwrap_or(chrono::Duration::zero());
        Self {
            id: OutboxEntryId::new(),
            job_id: job.id,
            callback_url: job.callback_url.clone(),
            notification,
            attempts: 0,
            last_error: None,
            next_attempt_at: now + grace,
            delivered_at: None,
            abandoned_at: None,
            created_at: now,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.delivered_at.is_some() || self.abandoned_at.is_some()
    }
}
