use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::Response;
use uuid::Uuid;

use super::error::error_response;
use crate::domain::UserId;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated caller, as asserted by the upstream auth layer.
#[derive(Debug, Clone, Copy)]
pub struct Principal(pub UserId);

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                error_response(
                    StatusCode::UNAUTHORIZED,
                    format!("Missing {} header", USER_ID_HEADER),
                )
            })?;

        Uuid::parse_str(raw)
            .map(|uuid| Principal(UserId::from_uuid(uuid)))
            .map_err(|_| {
                error_response(
                    StatusCode::UNAUTHORIZED,
                    format!("Invalid {} header", USER_ID_HEADER),
                )
            })
    }
}
