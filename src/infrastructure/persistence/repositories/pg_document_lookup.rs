use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{DocumentLookup, RepositoryError};
use crate::domain::{DocumentId, DocumentMetadata, UserId};

/// Reads the document subsystem's `documents` table.
pub struct PgDocumentLookup {
    pool: PgPool,
}

impl PgDocumentLookup {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct DocumentRow {
    id: Uuid,
    title: String,
    file_path: String,
    file_size: i64,
    uploaded_by: Option<Uuid>,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl DocumentLookup for PgDocumentLookup {
    #[instrument(skip(self), fields(document_id = %id.as_uuid()))]
    async fn resolve(&self, id: DocumentId) -> Result<Option<DocumentMetadata>, RepositoryError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, title, file_path, file_size, uploaded_by, created_at
            FROM documents
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(row.map(|r| DocumentMetadata {
            id: DocumentId::from_uuid(r.id),
            title: r.title,
            file_path: r.file_path,
            file_size: r.file_size,
            uploaded_by: r.uploaded_by.map(UserId::from_uuid),
            created_at: r.created_at,
        }))
    }
}
