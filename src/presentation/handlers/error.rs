use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::services::IngestionError;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

impl IntoResponse for IngestionError {
    fn into_response(self) -> Response {
        let status = match &self {
            IngestionError::NotFound(_) => StatusCode::NOT_FOUND,
            IngestionError::InvalidState(_) | IngestionError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            IngestionError::Conflict(_) => StatusCode::CONFLICT,
            IngestionError::QueueUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            IngestionError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Ingestion request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Ingestion request rejected");
        }

        error_response(status, self.to_string())
    }
}
