//! Validation feed and status updates

use axum::{
    body::Bytes,
    extract::{Query, State},
    response::Response,
    Json,
};
use futures::TryStreamExt;
use idesk_common::api::{PatchResponse, StatusPatch};
use idesk_common::feed::{today_in, validation_filter};
use idesk_common::store::FieldUpdate;
use idesk_common::task::fields;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::parse_body;
use super::stream::ndjson_response;
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ValidationQuery {
    pub date: Option<String>,
}

/// GET /api/validations[?date=...]
///
/// With `date`, every task whose `receivedDateTime` contains it. Without,
/// the live feed: tasks not yet in a final status that are still pending or
/// scheduled for today or later.
pub async fn get_validations(
    State(state): State<AppState>,
    Query(query): Query<ValidationQuery>,
) -> Result<Response, ApiError> {
    let today = today_in(state.timezone);
    let filter = validation_filter(query.date.as_deref(), &today);
    debug!("Validation feed filter: {:?}", filter);

    let tasks = state.store.stream(filter).await?;
    let records = tasks.map_ok(|task| task.to_json());

    Ok(ndjson_response(
        "validations",
        records,
        "no-cache, no-transform",
    ))
}

/// PATCH /api/validations
///
/// Sets `status` on one task (`id`) or many (`ids`).
pub async fn patch_validations(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PatchResponse>, ApiError> {
    let patch: StatusPatch = parse_body(&body)?;
    let status = patch
        .status
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing status".to_string()))?;
    let update = FieldUpdate::set(fields::STATUS, status.clone());

    if let Some(ids) = patch.ids {
        let count = state.store.update_many(&ids, update).await?;
        info!("Status '{}' applied to {} of {} tasks", status, count, ids.len());
        return Ok(Json(PatchResponse::with_count(count)));
    }

    let id = patch
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(ApiError::missing_id)?;

    if state.store.update_one(&id, update).await? == 0 {
        warn!("Status update for unknown task {}", id);
    }

    Ok(Json(PatchResponse::ok()))
}
