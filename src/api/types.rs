//! Shared types for the API layer.

use std::sync::Arc;

use base64::Engine;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::core_state::CoreState;
use crate::models::GeoLocation;

/// Headroom on top of the image limit for multipart framing and base64 expansion.
const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared context for all API routes.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
    pub max_upload_bytes: usize,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>, max_upload_bytes: usize) -> Self {
        Self {
            core,
            max_upload_bytes,
        }
    }

    /// Request body cap: a base64 data URL of a maximum-size image still fits.
    pub fn body_limit(&self) -> usize {
        self.max_upload_bytes / 3 * 4 + 4 + BODY_OVERHEAD_BYTES
    }

    /// Reject uploads over the configured limit with 413.
    pub fn check_upload_size(&self, len: usize) -> Result<(), ApiError> {
        if len > self.max_upload_bytes {
            return Err(ApiError::PayloadTooLarge(format!(
                "File size should be less than {}MB",
                self.max_upload_bytes / (1024 * 1024)
            )));
        }
        Ok(())
    }
}

/// `POST /api/analyze/data-url` body.
#[derive(Debug, Deserialize)]
pub struct DataUrlRequest {
    /// `data:image/...;base64,...` or bare base64.
    pub data: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Combine optional coordinates: both or neither.
pub fn parse_location(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<Option<GeoLocation>, ApiError> {
    match (latitude, longitude) {
        (Some(lat), Some(lon)) => Ok(Some(GeoLocation::new(lat, lon)?)),
        (None, None) => Ok(None),
        _ => Err(ApiError::BadRequest(
            "latitude and longitude must be provided together".into(),
        )),
    }
}

/// Decode a data URL (or raw base64) to bytes.
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>, String> {
    let base64_data = match data_url.find(',') {
        Some(idx) => &data_url[idx + 1..],
        None => data_url,
    };

    base64::engine::general_purpose::STANDARD
        .decode(base64_data.trim())
        .map_err(|e| format!("Base64 decode failed: {e}"))
}
