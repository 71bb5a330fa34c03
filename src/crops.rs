//! Crop suggestions derived from a finished soil report.
//!
//! Rules look at two readings only: pH and nitrogen.

use serde::{Deserialize, Serialize};

use crate::models::SoilAnalysis;

const PH_READING: &str = "pH Level";
const NITROGEN_READING: &str = "Nitrogen (N)";

/// Neutral pH assumed when the report has no usable pH reading.
const DEFAULT_PH: f64 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropSuggestion {
    pub crop: String,
    pub confidence: Confidence,
    pub details: String,
}

impl CropSuggestion {
    fn new(crop: &str, confidence: Confidence, details: &str) -> Self {
        Self {
            crop: crop.into(),
            confidence,
            details: details.into(),
        }
    }
}

pub fn suggest_crops(analysis: &SoilAnalysis) -> Vec<CropSuggestion> {
    // A zero pH is treated as unmeasured
    let ph = analysis
        .find_reading(PH_READING)
        .map(|r| r.value)
        .filter(|v| *v != 0.0)
        .unwrap_or(DEFAULT_PH);
    let nitrogen = analysis
        .find_reading(NITROGEN_READING)
        .map_or(0.0, |r| r.value);

    let mut suggestions = Vec::new();

    if (6.0..=7.0).contains(&ph) {
        suggestions.push(CropSuggestion::new(
            "Tomatoes",
            Confidence::High,
            "Ideal pH and nitrogen levels for tomato growth",
        ));
    }

    if ph >= 6.5 && nitrogen >= 40.0 {
        suggestions.push(CropSuggestion::new(
            "Leafy Greens",
            Confidence::High,
            "Good nitrogen levels for leaf development",
        ));
    }

    tracing::debug!(
        analysis_id = %analysis.id,
        ph,
        nitrogen,
        count = suggestions.len(),
        "Crop suggestions computed"
    );
    suggestions
}
