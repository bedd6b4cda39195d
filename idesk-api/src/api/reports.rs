//! Branch report endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use futures::TryStreamExt;
use idesk_common::report::{date_range_filter, DateField, Report};
use serde::Deserialize;
use tracing::info;

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub date_field: Option<String>,
}

/// GET /api/reports[?startDate=YYYY-MM-DD&endDate=YYYY-MM-DD&dateField=interview|received]
///
/// Per-branch totals with counts by status and by round.
pub async fn get_reports(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Report>, ApiError> {
    let field = match query.date_field.as_deref().filter(|f| !f.is_empty()) {
        Some(name) => DateField::parse(name)?,
        None => DateField::default(),
    };
    let filter = date_range_filter(
        query.start_date.as_deref(),
        query.end_date.as_deref(),
        field,
    )?;

    let report = state
        .store
        .stream(filter)
        .await?
        .try_fold(Report::new(), |mut report, task| async move {
            report.record(&task);
            Ok::<_, idesk_common::Error>(report)
        })
        .await?;

    info!("Report built over {} tasks", report.total());
    Ok(Json(report))
}
