use axum::extract::State;
use axum::Json;

use crate::api::types::ApiContext;
use crate::pipeline::analysis::NutrientCatalog;

/// `GET /api/catalog`: the nutrient table the analyzer runs with.
pub async fn get(State(ctx): State<ApiContext>) -> Json<NutrientCatalog> {
    Json(ctx.core.analyzer().catalog().clone())
}
