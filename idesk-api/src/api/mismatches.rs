//! Round mismatch feed and round corrections
//!
//! GET streams tasks whose round is not canonical; PATCH writes the
//! `actualRound` override for one task or many.

use axum::{body::Bytes, extract::State, response::Response, Json};
use idesk_common::api::{PatchResponse, RoundPatch};
use idesk_common::mismatch::mismatch_stream;
use idesk_common::store::{FieldUpdate, TaskFilter};
use idesk_common::task::fields;
use tracing::{info, warn};

use super::parse_body;
use super::stream::ndjson_response;
use crate::error::ApiError;
use crate::AppState;

/// GET /api/mismatches
///
/// Stream of [`idesk_common::MismatchRecord`], one per line, in store order.
/// Tasks without an `actualRound` never reach the classifier.
pub async fn get_mismatches(State(state): State<AppState>) -> Result<Response, ApiError> {
    let tasks = state.store.stream(TaskFilter::HasActualRound).await?;
    Ok(ndjson_response("mismatches", mismatch_stream(tasks), "no-cache"))
}

/// PATCH /api/mismatches
///
/// `{"ids": [...], "actualRound": ...}` updates every listed task and reports
/// the matched count. `{"id": ..., "actualRound": ...}` updates one task.
/// `actualRound: null` removes the override; a body without `actualRound`
/// is rejected before any write.
pub async fn patch_mismatches(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PatchResponse>, ApiError> {
    let patch: RoundPatch = parse_body(&body)?;

    if let Some(ids) = patch.ids {
        let round = required_round(patch.actual_round)?;
        let update = FieldUpdate::set_or_unset(fields::ACTUAL_ROUND, round.clone());
        let count = state.store.update_many(&ids, update).await?;
        info!(
            "Round override {:?} applied to {} of {} tasks",
            round,
            count,
            ids.len()
        );
        return Ok(Json(PatchResponse::with_count(count)));
    }

    let id = patch
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(ApiError::missing_id)?;
    let round = required_round(patch.actual_round)?;
    let update = FieldUpdate::set_or_unset(fields::ACTUAL_ROUND, round.clone());

    let matched = state.store.update_one(&id, update).await?;
    if matched == 0 {
        warn!("Round override for unknown task {}", id);
    } else {
        info!("Round override {:?} applied to task {}", round, id);
    }

    Ok(Json(PatchResponse::ok()))
}

fn required_round(actual_round: Option<Option<String>>) -> Result<Option<String>, ApiError> {
    actual_round.ok_or_else(|| ApiError::BadRequest("Missing actualRound".to_string()))
}
