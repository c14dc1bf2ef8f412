#![allow(dead_code)]

pub mod test_postgres;

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;

use docket::application::ports::{JobRepository, ProcessingError};
use docket::application::services::{
    IngestionMessage, IngestionService, IngestionWorker, JobDriver, NotificationDelivery,
    RetryPolicy,
};
use docket::domain::{DocumentId, DocumentMetadata, Job, JobId, JobStatus, UserId};
use docket::infrastructure::notification::RecordingCallbackNotifier;
use docket::infrastructure::persistence::{InMemoryDocumentLookup, InMemoryJobStore};
use docket::infrastructure::processing::MockProcessingClient;

pub const CALLBACK_URL: &str = "http://callbacks.test/ingestion";

/// Fully wired ingestion subsystem backed by in-memory stores and fakes.
pub struct TestHarness {
    pub store: Arc<InMemoryJobStore>,
    pub documents: Arc<InMemoryDocumentLookup>,
    pub processing: Arc<MockProcessingClient>,
    pub notifier: Arc<RecordingCallbackNotifier>,
    pub delivery: Arc<NotificationDelivery>,
    pub driver: Arc<JobDriver>,
    pub service: Arc<IngestionService>,
}

impl TestHarness {
    /// Starts a worker draining the queue in the background.
    pub fn running(processing: MockProcessingClient) -> Self {
        let (harness, receiver) = Self::build(processing, RecordingCallbackNotifier::new(), 64);
        let worker = IngestionWorker::new(receiver, Arc::clone(&harness.driver), 4);
        tokio::spawn(worker.run());
        harness
    }

    /// No worker; the returned receiver holds whatever gets enqueued.
    pub fn idle(
        processing: MockProcessingClient,
        queue_capacity: usize,
    ) -> (Self, mpsc::Receiver<IngestionMessage>) {
        Self::build(processing, RecordingCallbackNotifier::new(), queue_capacity)
    }

    pub fn build(
        processing: MockProcessingClient,
        notifier: RecordingCallbackNotifier,
        queue_capacity: usize,
    ) -> (Self, mpsc::Receiver<IngestionMessage>) {
        let store = Arc::new(InMemoryJobStore::new());
        let documents = Arc::new(InMemoryDocumentLookup::new());
        let processing = Arc::new(processing);
        let notifier = Arc::new(notifier);

        let delivery = Arc::new(NotificationDelivery::new(
            notifier.clone(),
            store.clone(),
            RetryPolicy::single_attempt(),
            3,
        ));
        let driver = Arc::new(JobDriver::new(
            store.clone(),
            processing.clone(),
            Arc::clone(&delivery),
            RetryPolicy::single_attempt(),
            Duration::ZERO,
        ));

        let (sender, receiver) = mpsc::channel(queue_capacity);
        let service = Arc::new(IngestionService::new(
            store.clone(),
            documents.clone(),
            sender,
        ));

        (
            Self {
                store,
                documents,
                processing,
                notifier,
                delivery,
                driver,
                service,
            },
            receiver,
        )
    }

    pub async fn add_document(&self) -> DocumentId {
        let document = DocumentMetadata::new(
            "Lecture 1".to_string(),
            "documents/lecture-1.pdf".to_string(),
            2048,
            None,
        );
        let id = document.id;
        self.documents.add(document).await;
        id
    }

    pub async fn wait_for_status(&self, id: JobId, status: JobStatus) -> Job {
        wait_for_status(self.store.as_ref(), id, status).await
    }
}

pub fn principal() -> UserId {
    UserId::new()
}

pub fn processing_result() -> Value {
    serde_json::json!({ "pages": 10 })
}

pub fn timeout_error() -> ProcessingError {
    ProcessingError::Timeout("no response within 30000ms".to_string())
}

/// Polls until the job reaches `status`. Panics after five seconds.
pub async fn wait_for_status(repository: &dyn JobRepository, id: JobId, status: JobStatus) -> Job {
    for _ in 0..500 {
        if let Some(job) = repository.get_by_id(id).await.expect("get_by_id failed") {
            if job.status == status {
                return job;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} never reached {}", id.as_uuid(), status);
}
