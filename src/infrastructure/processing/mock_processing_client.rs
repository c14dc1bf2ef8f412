use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, Semaphore};

use crate::application::ports::{ProcessingClient, ProcessingError};
use crate::domain::{DocumentId, JobId};

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingCall {
    pub job_id: JobId,
    pub document_id: DocumentId,
    pub job_type: String,
}

/// Scripted processing service. Queued responses are used first, then the fallback.
///
/// With a gate, every call waits for one permit before answering, which lets a
/// caller hold a job in `PROCESSING`.
pub struct MockProcessingClient {
    responses: Mutex<VecDeque<Result<Value, ProcessingError>>>,
    fallback: Result<Value, ProcessingError>,
    calls: Mutex<Vec<ProcessingCall>>,
    gate: Option<Arc<Semaphore>>,
}

impl MockProcessingClient {
    pub fn succeeding(result: Value) -> Self {
        Self::scripted(Vec::new(), Ok(result))
    }

    pub fn failing(error: ProcessingError) -> Self {
        Self::scripted(Vec::new(), Err(error))
    }

    pub fn scripted(
        responses: Vec<Result<Value, ProcessingError>>,
        fallback: Result<Value, ProcessingError>,
    ) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            fallback,
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub async fn calls(&self) -> Vec<ProcessingCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl ProcessingClient for MockProcessingClient {
    async fn process(
        &self,
        job_id: JobId,
        document_id: DocumentId,
        job_type: &str,
    ) -> Result<Value, ProcessingError> {
        self.calls.lock().await.push(ProcessingCall {
            job_id,
            document_id,
            job_type: job_type.to_string(),
        });

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        match self.responses.lock().await.pop_front() {
            Some(response) => response,
            None => self.fallback.clone(),
        }
    }
}
