use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{NotificationOutbox, RepositoryError};
use crate::domain::{JobId, OutboxEntry, OutboxEntryId, OutcomeNotification};

const OUTBOX_COLUMNS: &str = "id, job_id, callback_url, payload, attempts, last_error, \
                              next_attempt_at, delivered_at, abandoned_at, created_at";

const CLAIMED_COLUMNS: &str = "notification_outbox.id, notification_outbox.job_id, \
    notification_outbox.callback_url, notification_outbox.payload, notification_outbox.attempts, \
    notification_outbox.last_error, notification_outbox.next_attempt_at, \
    notification_outbox.delivered_at, notification_outbox.abandoned_at, \
    notification_outbox.created_at";

pub struct PgNotificationOutbox {
    pool: PgPool,
}

impl PgNotificationOutbox {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct OutboxRow {
    id: Uuid,
    job_id: Uuid,
    callback_url: String,
    payload: Json<OutcomeNotification>,
    attempts: i32,
    last_error: Option<String>,
    next_attempt_at: DateTime<Utc>,
    delivered_at: Option<DateTime<Utc>>,
    abandoned_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<OutboxRow> for OutboxEntry {
    fn from(r: OutboxRow) -> Self {
        OutboxEntry {
            id: OutboxEntryId::from_uuid(r.id),
            job_id: JobId::from_uuid(r.job_id),
            callback_url: r.callback_url,
            notification: r.payload.0,
            attempts: r.attempts,
            last_error: r.last_error,
            next_attempt_at: r.next_attempt_at,
            delivered_at: r.delivered_at,
            abandoned_at: r.abandoned_at,
            created_at: r.created_at,
        }
    }
}

/// Writes an outbox row inside the caller's transaction.
pub(super) async fn insert_outbox_entry(
    tx: &mut Transaction<'_, Postgres>,
    entry: &OutboxEntry,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r#"
        INSERT INTO notification_outbox
            (id, job_id, callback_url, payload, attempts, last_error,
             next_attempt_at, delivered_at, abandoned_at, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(entry.id.as_uuid())
    .bind(entry.job_id.as_uuid())
    .bind(&entry.callback_url)
    .bind(Json(&entry.notification))
    .bind(entry.attempts)
    .bind(&entry.last_error)
    .bind(entry.next_attempt_at)
    .bind(entry.delivered_at)
    .bind(entry.abandoned_at)
    .bind(entry.created_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

    Ok(())
}

#[async_trait]
impl NotificationOutbox for PgNotificationOutbox {
    #[instrument(skip(self))]
    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        lease: Duration,
        limit: usize,
    ) -> Result<Vec<OutboxEntry>, RepositoryError> {
        let lease_until = now + chrono::Duration::from_std(lease).unwrap_or(chrono::Duration::zero());

        // SKIP LOCKED keeps concurrent relays from claiming the same rows.
        let rows = sqlx::query_as::<_, OutboxRow>(&format!(
            r#"
            WITH claimed AS (
                SELECT id FROM notification_outbox
                WHERE delivered_at IS NULL AND abandoned_at IS NULL AND next_attempt_at <= $1
                ORDER BY next_attempt_at
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            UPDATE notification_outbox
            SET next_attempt_at = $3
            FROM claimed
            WHERE notification_outbox.id = claimed.id
            RETURNING {CLAIMED_COLUMNS}
            "#
        ))
        .bind(now)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .bind(lease_until)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        let mut entries: Vec<OutboxEntry> = rows.into_iter().map(OutboxEntry::from).collect();
        entries.sort_by_key(|e| e.created_at);
        Ok(entries)
    }

    #[instrument(skip(self), fields(entry_id = %id.as_uuid()))]
    async fn mark_delivered(&self, id: OutboxEntryId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE notification_outbox
            SET delivered_at = $1, attempts = attempts + 1, last_error = NULL
            WHERE id = $2
            "#,
        )
        .bind(Utc::now())
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.as_uuid().to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self, error), fields(entry_id = %id.as_uuid(), abandon))]
    async fn record_failure(
        &self,
        id: OutboxEntryId,
        error: &str,
        next_attempt_at: DateTime<Utc>,
        abandon: bool,
    ) -> Result<(), RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE notification_outbox
            SET attempts = attempts + 1,
                last_error = $1,
                next_attempt_at = $2,
                abandoned_at = CASE WHEN $3 THEN $4 ELSE NULL END
            WHERE id = $5
            "#,
        )
        .bind(error)
        .bind(next_attempt_at)
        .bind(abandon)
        .bind(now)
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.as_uuid().to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(job_id = %job_id.as_uuid()))]
    async fn list_for_job(&self, job_id: JobId) -> Result<Vec<OutboxEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, OutboxRow>(&format!(
            "SELECT {OUTBOX_COLUMNS} FROM notification_outbox WHERE job_id = $1 ORDER BY created_at"
        ))
        .bind(job_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(rows.into_iter().map(OutboxEntry::from).collect())
    }
}
