//! HTTP error mapping
//!
//! Every failure leaves the service as `{"error": message}` with a 400 for
//! caller mistakes and a 500 for everything else.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use idesk_common::api::ErrorResponse;
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl ApiError {
    pub fn missing_id() -> Self {
        ApiError::BadRequest("Missing ID".to_string())
    }
}

impl From<idesk_common::Error> for ApiError {
    fn from(e: idesk_common::Error) -> Self {
        match e {
            idesk_common::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => {
                error!("Request failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
