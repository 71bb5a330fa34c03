//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub nutrients_tracked: usize,
    pub analyses_stored: u64,
}

/// `GET /api/health`
pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    let analyses_stored = {
        let conn = ctx.core.lock_db()?;
        db::count_analyses(&conn)?
    };

    Ok(Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        nutrients_tracked: ctx.core.analyzer().catalog().len(),
        analyses_stored,
    }))
}
