use async_trait::async_trait;

use crate::domain::{DocumentId, DocumentMetadata};

use super::RepositoryError;

#[async_trait]
pub trait DocumentLookup: Send + Sync {
    async fn resolve(&self, id: DocumentId) -> Result<Option<DocumentMetadata>, RepositoryError>;
}
