use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::application::ports::{ProcessingClient, ProcessingError};
use crate::domain::{DocumentId, JobId};

pub const PROCESS_PATH: &str = "/process";

/// Calls the external processing service over HTTP.
pub struct HttpProcessingClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProcessRequest<'a> {
    job_id: Uuid,
    document_id: Uuid,
    #[serde(rename = "type")]
    job_type: &'a str,
}

impl HttpProcessingClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProcessingError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProcessingError::Transport(format!("client build failed: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), PROCESS_PATH),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ProcessingClient for HttpProcessingClient {
    async fn process(
        &self,
        job_id: JobId,
        document_id: DocumentId,
        job_type: &str,
    ) -> Result<Value, ProcessingError> {
        let request_body = ProcessRequest {
            job_id: job_id.as_uuid(),
            document_id: document_id.as_uuid(),
            job_type,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProcessingError::Timeout(format!(
                        "no response within {}ms",
                        self.timeout.as_millis()
                    ))
                } else {
                    ProcessingError::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProcessingError::Rejected { status, body });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ProcessingError::Timeout(format!(
                    "response body not received within {}ms",
                    self.timeout.as_millis()
                ))
            } else {
                ProcessingError::InvalidResponse(e.to_string())
            }
        })?;

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| ProcessingError::InvalidResponse(e.to_string()))
    }
}
