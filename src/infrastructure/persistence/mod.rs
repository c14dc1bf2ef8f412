mod pg_pool;
mod repositories;

pub use repositories::InMemoryDocumentLookup;
pub use repositories::InMemoryJobStore;
pub use repositories::PgDocumentLookup;
pub use repositories::PgJobRepository;
pub use repositories::PgNotificationOutbox;

pub use pg_pool::{create_pool, run_migrations};
