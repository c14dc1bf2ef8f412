use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
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

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of a stored document, owned by the document subsystem.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentMetadata {
    pub id: DocumentId,
    pub title: String,
    pub file_path: String,
    pub file_size: i64,
    pub uploaded_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl DocumentMetadata {
    pub fn new(title: String, file_path: String, file_size: i64, uploaded_by: Option<UserId>) -> Self {
        Self {
            id: DocumentId::new(),
            title,
            file_path,
            file_size,
            uploaded_by,
            created_at: Utc::now(),
        }
    }
}
