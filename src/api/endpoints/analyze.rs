//! Analysis endpoints: upload an image, get a stored soil report back.
//!
//! Decode and analysis are CPU-bound and run on the blocking pool.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{decode_data_url, parse_location, ApiContext, DataUrlRequest};
use crate::models::{GeoLocation, SoilAnalysis};

/// `POST /api/analyze`: multipart with an `image` file field and optional
/// `latitude` / `longitude` text fields.
pub async fn upload(
    State(ctx): State<ApiContext>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SoilAnalysis>), ApiError> {
    let mut image: Option<Vec<u8>> = None;
    let mut latitude: Option<f64> = None;
    let mut longitude: Option<f64> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("image") => {
                let bytes = field.bytes().await.map_err(multipart_error)?;
                image = Some(bytes.to_vec());
            }
            Some("latitude") => {
                let text = field.text().await.map_err(multipart_error)?;
                latitude = Some(parse_coordinate("latitude", &text)?);
            }
            Some("longitude") => {
                let text = field.text().await.map_err(multipart_error)?;
                longitude = Some(parse_coordinate("longitude", &text)?);
            }
            other => {
                tracing::debug!(field = ?other, "Ignoring unknown multipart field");
            }
        }
    }

    let image = image.ok_or_else(|| ApiError::BadRequest("Missing 'image' field".into()))?;
    let location = parse_location(latitude, longitude)?;
    analyze_and_store(ctx, image, location).await
}

/// `POST /api/analyze/data-url`: JSON body carrying a base64 data URL.
pub async fn data_url(
    State(ctx): State<ApiContext>,
    Json(payload): Json<DataUrlRequest>,
) -> Result<(StatusCode, Json<SoilAnalysis>), ApiError> {
    let image = decode_data_url(&payload.data)
        .map_err(|e| ApiError::BadRequest(format!("Invalid image data: {e}")))?;
    let location = parse_location(payload.latitude, payload.longitude)?;
    analyze_and_store(ctx, image, location).await
}

async fn analyze_and_store(
    ctx: ApiContext,
    image: Vec<u8>,
    location: Option<GeoLocation>,
) -> Result<(StatusCode, Json<SoilAnalysis>), ApiError> {
    ctx.check_upload_size(image.len())?;

    let size = image.len();
    let core = ctx.core.clone();
    let analysis = tokio::task::spawn_blocking(move || core.analyze_and_store(&image, location))
        .await
        .map_err(|e| ApiError::Internal(format!("Analysis task failed: {e}")))??;

    tracing::info!(
        analysis_id = %analysis.id,
        bytes = size,
        geotagged = analysis.location.is_some(),
        "Analysis stored"
    );
    Ok((StatusCode::CREATED, Json(analysis)))
}

fn parse_coordinate(name: &str, value: &str) -> Result<f64, ApiError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| ApiError::BadRequest(format!("Invalid {name}: {value:?}")))
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(format!("Malformed multipart body: {}", err.body_text()))
    }
}
