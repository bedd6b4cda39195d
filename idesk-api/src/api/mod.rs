//! HTTP API handlers for idesk-api

pub mod buildinfo;
pub mod health;
pub mod mismatches;
pub mod reports;
pub mod stream;
pub mod validations;

pub use buildinfo::get_build_info;
pub use health::health_routes;
pub use mismatches::{get_mismatches, patch_mismatches};
pub use reports::get_reports;
pub use validations::{get_validations, patch_validations};

use axum::body::Bytes;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Decode a JSON request body, reporting malformed input as a 400
pub(crate) fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))
}
