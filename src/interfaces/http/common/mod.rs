//! Shared HTTP plumbing: response envelope, error mapping, extractors

pub mod validated_json;

pub use validated_json::{ApiPath, ValidatedJson, ValidatedQuery, ValidationRejection};

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::domain::DomainError;

/// Standard API response envelope
///
/// Success: `{"success": true, "data": {...}}`,
/// failure: `{"success": false, "data": null, "error": "description"}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

pub type ApiError = (StatusCode, Json<ApiResponse<()>>);

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Validation(_) | DomainError::InvalidDateRange | DomainError::EmptyPatch => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::AlreadyExists(_) => StatusCode::CONFLICT,
        DomainError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Maps a domain error to its HTTP response. Storage details are logged, not returned.
pub fn error_response(err: DomainError) -> ApiError {
    let status = status_for(&err);
    let message = match &err {
        DomainError::Storage(detail) => {
            error!("Storage failure: {}", detail);
            "Internal server error".to_string()
        }
        other => other.to_string(),
    };
    (status, Json(ApiResponse::error(message)))
}
