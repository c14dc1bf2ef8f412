mod in_memory_store;
mod pg_document_lookup;
mod pg_job_repository;
mod pg_notification_outbox;

pub use in_memory_store::{InMemoryDocumentLookup, InMemoryJobStore};
pub use pg_document_lookup::PgDocumentLookup;
pub use pg_job_repository::PgJobRepository;
pub use pg_notification_outbox::PgNotificationOutbox;
