mod callback_notifier;
mod document_lookup;
mod job_repository;
mod notification_outbox;
mod processing_client;
mod repository_error;
mod retryable;

pub use callback_notifier::{CallbackNotifier, NotificationError};
pub use document_lookup::DocumentLookup;
pub use job_repository::JobRepository;
pub use notification_outbox::NotificationOutbox;
pub use processing_client::{ProcessingClient, ProcessingError};
pub use repository_error::RepositoryError;
pub use retryable::Retryable;
