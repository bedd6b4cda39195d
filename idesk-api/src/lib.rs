//! idesk-api library - Interview Support dashboard service
//!
//! Streams task feeds as NDJSON, accepts round and status corrections and
//! serves branch reports.

use std::sync::Arc;

use axum::Router;
use chrono_tz::Tz;
use idesk_common::store::TaskStore;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Task collection access
    pub store: Arc<dyn TaskStore>,
    /// Zone in which the live feed computes "today"
    pub timezone: Tz,
}

impl AppState {
    /// Create new application state
    pub fn new(store: Arc<dyn TaskStore>, timezone: Tz) -> Self {
        Self { store, timezone }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let feeds = Router::new()
        .route(
            "/api/mismatches",
            get(api::get_mismatches).patch(api::patch_mismatches),
        )
        .route(
            "/api/validations",
            get(api::get_validations).patch(api::patch_validations),
        )
        .route("/api/reports", get(api::get_reports))
        .route("/api/buildinfo", get(api::get_build_info));

    Router::new()
        .merge(feeds)
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
