use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{JobRepository, RepositoryError};
use crate::domain::{DocumentId, Job, JobId, JobStatus, OutboxEntry, UserId};

use super::pg_notification_outbox::insert_outbox_entry;

const JOB_COLUMNS: &str = "id, document_id, job_type, status, callback_url, error_message, \
                           created_by, version, created_at, updated_at";

pub struct PgJobRepository {
    pool: PgPool,
}

impl PgJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct JobRow {
    id: Uuid,
    document_id: Uuid,
    job_type: String,
    status: String,
    callback_url: String,
    error_message: Option<String>,
    created_by: Uuid,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = RepositoryError;

    fn try_from(r: JobRow) -> Result<Self, Self::Error> {
        let status = r
            .status
            .parse::<JobStatus>()
            .map_err(RepositoryError::QueryFailed)?;

        Ok(Job {
            id: JobId::from_uuid(r.id),
            document_id: DocumentId::from_uuid(r.document_id),
            job_type: r.job_type,
            status,
            callback_url: r.callback_url,
            error_message: r.error_message,
            created_by: UserId::from_uuid(r.created_by),
            version: r.version,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

fn query_failed(e: sqlx::Error) -> RepositoryError {
    RepositoryError::QueryFailed(e.to_string())
}

#[async_trait]
impl JobRepository for PgJobRepository {
    #[instrument(skip(self, job), fields(job_id = %job.id.as_uuid()))]
    async fn insert(&self, job: &Job) -> Result<JobId, RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO ingestion_jobs
                (id, document_id, job_type, status, callback_url, error_message,
                 created_by, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(job.id.as_uuid())
        .bind(job.document_id.as_uuid())
        .bind(&job.job_type)
        .bind(job.status.as_str())
        .bind(&job.callback_url)
        .bind(&job.error_message)
        .bind(job.created_by.as_uuid())
        .bind(job.version)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => RepositoryError::ConstraintViolation(format!(
                "ingestion job {} already exists",
                job.id.as_uuid()
            )),
            _ => query_failed(e),
        })?;

        Ok(job.id)
    }

    #[instrument(skip(self), fields(job_id = %id.as_uuid()))]
    async fn get_by_id(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM ingestion_jobs WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        row.map(Job::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<Job>, RepositoryError> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM ingestion_jobs WHERE deleted_at IS NULL ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        rows.into_iter().map(Job::try_from).collect()
    }

    #[instrument(skip(self), fields(status = %status))]
    async fn list_by_status(&self, status: JobStatus) -> Result<Vec<Job>, RepositoryError> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM ingestion_jobs \
             WHERE status = $1 AND deleted_at IS NULL ORDER BY created_at"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        rows.into_iter().map(Job::try_from).collect()
    }

    #[instrument(skip(self, job), fields(job_id = %job.id.as_uuid(), version = job.version))]
    async fn save(&self, job: &Job) -> Result<Job, RepositoryError> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            r#"
            UPDATE ingestion_jobs
            SET job_type = $1, callback_url = $2, version = version + 1, updated_at = $3
            WHERE id = $4 AND version = $5 AND deleted_at IS NULL
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(&job.job_type)
        .bind(&job.callback_url)
        .bind(Utc::now())
        .bind(job.id.as_uuid())
        .bind(job.version)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        if let Some(row) = row {
            return Job::try_from(row);
        }

        let exists: Option<i64> = sqlx::query_scalar(
            "SELECT version FROM ingestion_jobs WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(job.id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        match exists {
            Some(_) => Err(RepositoryError::VersionConflict {
                id: job.id.as_uuid().to_string(),
                expected: job.version,
            }),
            None => Err(RepositoryError::NotFound(job.id.as_uuid().to_string())),
        }
    }

    #[instrument(skip(self, error_message), fields(job_id = %id.as_uuid(), from = %from, to = %to))]
    async fn transition(
        &self,
        id: JobId,
        from: JobStatus,
        to: JobStatus,
        error_message: Option<&str>,
    ) -> Result<bool, RepositoryError> {
        if !from.can_transition_to(to) {
            return Ok(false);
        }

        let result = sqlx::query(
            r#"
            UPDATE ingestion_jobs
            SET status = $1, error_message = $2, version = version + 1, updated_at = $3
            WHERE id = $4 AND status = $5 AND deleted_at IS NULL
            "#,
        )
        .bind(to.as_str())
        .bind((to == JobStatus::Failed).then(|| error_message.unwrap_or("unknown failure")))
        .bind(Utc::now())
        .bind(id.as_uuid())
        .bind(from.as_str())
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self, entry), fields(job_id = %id.as_uuid(), status = %entry.notification.status))]
    async fn settle(
        &self,
        id: JobId,
        entry: &OutboxEntry,
    ) -> Result<Option<OutboxEntry>, RepositoryError> {
        let to = entry.notification.status;
        if !JobStatus::Processing.can_transition_to(to) {
            return Ok(None);
        }

        let mut tx = self.pool.begin().await.map_err(query_failed)?;

        let callback_url: Option<String> = sqlx::query_scalar(
            r#"
            UPDATE ingestion_jobs
            SET status = $1, error_message = $2, version = version + 1, updated_at = $3
            WHERE id = $4 AND status = 'PROCESSING' AND deleted_at IS NULL
            RETURNING callback_url
            "#,
        )
        .bind(to.as_str())
        .bind(entry.notification.error.as_deref())
        .bind(Utc::now())
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(query_failed)?;

        let Some(callback_url) = callback_url else {
            tx.rollback().await.map_err(query_failed)?;
            return Ok(None);
        };

        let recorded = OutboxEntry {
            callback_url,
            ..entry.clone()
        };
        insert_outbox_entry(&mut tx, &recorded).await?;
        tx.commit().await.map_err(query_failed)?;

        Ok(Some(recorded))
    }

    #[instrument(skip(self), fields(job_id = %id.as_uuid()))]
    async fn delete(&self, id: JobId) -> Result<(), RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE ingestion_jobs
            SET deleted_at = $1, updated_at = $1, version = version + 1
            WHERE id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(now)
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.as_uuid().to_string()));
        }
        Ok(())
    }
}
