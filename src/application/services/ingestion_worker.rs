use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::domain::JobId;

use super::{DriveOutcome, JobDriver};

#[derive(Debug, Clone, Copy)]
pub struct IngestionMessage {
    pub job_id: JobId,
}

/// Drains the ingestion queue, running at most `concurrency` drives at once.
pub struct IngestionWorker {
    receiver: mpsc::Receiver<IngestionMessage>,
    driver: Arc<JobDriver>,
    concurrency: usize,
}

impl IngestionWorker {
    pub fn new(
        receiver: mpsc::Receiver<IngestionMessage>,
        driver: Arc<JobDriver>,
        concurrency: usize,
    ) -> Self {
        Self {
            receiver,
            driver,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn run(mut self) {
        tracing::info!(concurrency = self.concurrency, "Ingestion worker started");

        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut in_flight = JoinSet::new();

        while let Some(msg) = self.receiver.recv().await {
            let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                break;
            };

            let driver = Arc::clone(&self.driver);
            let span = tracing::info_span!("ingestion_job", job_id = %msg.job_id.as_uuid());

            in_flight.spawn(
                async move {
                    let _permit = permit;
                    match driver.drive(msg.job_id).await {
                        Ok(DriveOutcome::Completed) => tracing::info!("Ingestion completed"),
                        Ok(DriveOutcome::Failed) => tracing::info!("Ingestion failed"),
                        Ok(outcome) => tracing::debug!(?outcome, "Ingestion drive ended early"),
                        Err(e) => tracing::error!(error = %e, "Ingestion job failed"),
                    }
                }
                .instrument(span),
            );

            while in_flight.try_join_next().is_some() {}
        }

        while in_flight.join_next().await.is_some() {}
        tracing::info!("Ingestion worker stopped: channel closed");
    }
}
