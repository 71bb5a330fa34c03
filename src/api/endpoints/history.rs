//! History endpoints: list, fetch, delete stored analyses and derive
//! reports (PDF, crop suggestions) from them.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::crops::{suggest_crops, CropSuggestion};
use crate::db;
use crate::models::{AnalysisSummary, SoilAnalysis};
use crate::report::{generate_report_pdf, report_file_name};

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct HistoryPage {
    pub items: Vec<AnalysisSummary>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

/// `GET /api/history?limit&offset`: newest first.
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryPage>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);

    let conn = ctx.core.lock_db()?;
    let items = db::list_analysis_summaries(&conn, limit, offset)?;
    let total = db::count_analyses(&conn)?;

    Ok(Json(HistoryPage {
        items,
        total,
        limit,
        offset,
    }))
}

/// `GET /api/history/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<SoilAnalysis>, ApiError> {
    Ok(Json(load(&ctx, &id)?))
}

/// `DELETE /api/history/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.lock_db()?;
    db::delete_analysis(&conn, &id)?;
    tracing::info!(analysis_id = %id, "Analysis deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/history/:id/report.pdf`
pub async fn report_pdf(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let analysis = load(&ctx, &id)?;
    let pdf = generate_report_pdf(&analysis)?;
    let disposition = format!("attachment; filename=\"{}\"", report_file_name(&analysis));

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    )
        .into_response())
}

/// `GET /api/history/:id/crops`
pub async fn crops(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Vec<CropSuggestion>>, ApiError> {
    let analysis = load(&ctx, &id)?;
    Ok(Json(suggest_crops(&analysis)))
}

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::BadRequest("Invalid ID format".into()))
}

fn load(ctx: &ApiContext, id: &str) -> Result<SoilAnalysis, ApiError> {
    let id = parse_id(id)?;
    let conn = ctx.core.lock_db()?;
    db::get_analysis(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound(format!("No analysis with id {id}")))
}
