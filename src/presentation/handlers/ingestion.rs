use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::error_response;
use super::principal::Principal;
use crate::application::services::CreateJobRequest;
use crate::domain::{DocumentId, Job, JobId, JobPatch};
use crate::presentation::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIngestionRequest {
    pub document_id: Uuid,
    #[serde(rename = "type")]
    pub job_type: String,
    pub callback_url: String,
}

/// Only caller-editable fields. Anything else, `status` included, is rejected.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateIngestionRequest {
    #[serde(rename = "type")]
    pub job_type: Option<String>,
    pub callback_url: Option<String>,
    pub version: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionJobResponse {
    pub id: String,
    pub document_id: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub status: String,
    pub callback_url: String,
    pub error: Option<String>,
    pub created_by: String,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Job> for IngestionJobResponse {
    fn from(job: Job) -> Self {
        Self {
            id: job.id.as_uuid().to_string(),
            document_id: job.document_id.as_uuid().to_string(),
            job_type: job.job_type,
            status: job.status.as_str().to_string(),
            callback_url: job.callback_url,
            error: job.error_message,
            created_by: job.created_by.as_uuid().to_string(),
            version: job.version,
            created_at: job.created_at.to_rfc3339(),
            updated_at: job.updated_at.to_rfc3339(),
        }
    }
}

fn parse_job_id(raw: &str) -> Result<JobId, Response> {
    Uuid::parse_str(raw)
        .map(JobId::from_uuid)
        .map_err(|_| error_response(StatusCode::BAD_REQUEST, format!("Invalid job ID: {}", raw)))
}

#[tracing::instrument(skip(state, request), fields(user_id = %principal.0.as_uuid()))]
pub async fn create_ingestion_handler(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<CreateIngestionRequest>,
) -> Response {
    let request = CreateJobRequest {
        document_id: DocumentId::from_uuid(request.document_id),
        job_type: request.job_type,
        callback_url: request.callback_url,
    };

    match state.ingestion_service.create(request, principal.0).await {
        Ok(job) => (StatusCode::CREATED, Json(IngestionJobResponse::from(job))).into_response(),
        Err(e) => e.into_response(),
    }
}

#[tracing::instrument(skip(state))]
pub async fn list_ingestions_handler(State(state): State<AppState>) -> Response {
    match state.ingestion_service.list_all().await {
        Ok(jobs) => {
            let body: Vec<IngestionJobResponse> =
                jobs.into_iter().map(IngestionJobResponse::from).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

#[tracing::instrument(skip(state))]
pub async fn get_ingestion_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Response {
    let id = match parse_job_id(&job_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.ingestion_service.get(id).await {
        Ok(job) => (StatusCode::OK, Json(IngestionJobResponse::from(job))).into_response(),
        Err(e) => e.into_response(),
    }
}

#[tracing::instrument(skip(state, request))]
pub async fn update_ingestion_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Json(request): Json<UpdateIngestionRequest>,
) -> Response {
    let id = match parse_job_id(&job_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let patch = JobPatch {
        job_type: request.job_type,
        callback_url: request.callback_url,
        expected_version: request.version,
    };

    match state.ingestion_service.update(id, patch).await {
        Ok(job) => (StatusCode::OK, Json(IngestionJobResponse::from(job))).into_response(),
        Err(e) => e.into_response(),
    }
}

#[tracing::instrument(skip(state))]
pub async fn delete_ingestion_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Response {
    let id = match parse_job_id(&job_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.ingestion_service.remove(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}
