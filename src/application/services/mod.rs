mod ingestion_service;
mod ingestion_worker;
mod job_driver;
mod notification_delivery;
mod outbox_relay;
mod retry_policy;

pub use ingestion_service::{CreateJobRequest, IngestionError, IngestionService};
pub use ingestion_worker::{IngestionMessage, IngestionWorker};
pub use job_driver::{DriveError, DriveOutcome, INTERRUPTED_MESSAGE, JobDriver};
pub use notification_delivery::{DeliveryOutcome, NotificationDelivery};
pub use outbox_relay::OutboxRelay;
pub use retry_policy::{RetryError, RetryPolicy};
