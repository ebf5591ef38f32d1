//! HTTP error mapping.

use api_shared::ErrorRes;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use medchat_core::PatientError;

/// Errors returned by REST handlers, each mapped to a status and an [`ErrorRes`] body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Rejected(#[from] JsonRejection),
    #[error("{0}")]
    Store(PatientError),
    #[error("notifications are not configured")]
    NotifierUnavailable,
    #[error("{0}")]
    Delivery(PatientError),
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Rejected(rejection) => rejection.status(),
            ApiError::Store(e) => {
                tracing::error!("record store error: {:?}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::NotifierUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Delivery(e) => {
                tracing::error!("notification delivery error: {:?}", e);
                StatusCode::BAD_GATEWAY
            }
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        };

        let message = match &self {
            ApiError::Rejected(rejection) => rejection.body_text(),
            other => other.to_string(),
        };

        (status, Json(ErrorRes::new(message))).into_response()
    }
}
