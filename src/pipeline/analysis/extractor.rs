//! Pixel characteristic extraction.
//!
//! Two linear passes over the decoded buffer:
//! 1. Soil-likeness gate: the share of pixels whose color matches a reddish,
//!    brown or sandy soil heuristic must exceed [`SOIL_FRACTION_THRESHOLD`].
//! 2. Reduction of every pixel into four saturating [0, 1] characteristics.
//!
//! The second pass only runs once the first has accepted the image.

use tracing::debug;

use super::types::{PixelBuffer, SoilCharacteristics};
use super::AnalysisError;

/// Images at or below this soil-like pixel share are rejected.
pub const SOIL_FRACTION_THRESHOLD: f64 = 0.35;

/// Brightness below which a pixel counts toward organic matter.
const DARK_BRIGHTNESS: f64 = 128.0;

/// Outcome of the soil-likeness pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoilLikeness {
    pub soil_like: usize,
    pub total: usize,
}

impl SoilLikeness {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.soil_like as f64 / self.total as f64
    }

    pub fn is_soil(&self) -> bool {
        self.fraction() > SOIL_FRACTION_THRESHOLD
    }
}

/// Reddish, brown or sandy pixel.
pub fn is_soil_colored(r: u8, g: u8, b: u8) -> bool {
    let reddish = r > g && r > b;
    let brown = r > 60 && g > 40 && b < 40;
    let sandy = r > 120 && g > 80 && b < 60;
    reddish || brown || sandy
}

/// Count soil-colored pixels.
pub fn measure_soil_likeness(buffer: &PixelBuffer) -> SoilLikeness {
    let soil_like = buffer
        .pixels()
        .filter(|[r, g, b, _]| is_soil_colored(*r, *g, *b))
        .count();
    SoilLikeness {
        soil_like,
        total: buffer.pixel_count(),
    }
}

/// Validate the buffer, run the soil-likeness gate, then reduce it to characteristics.
pub fn extract(buffer: &PixelBuffer) -> Result<SoilCharacteristics, AnalysisError> {
    if buffer.is_empty() {
        return Err(AnalysisError::Validation(
            "Image has no pixels to analyze".into(),
        ));
    }

    let likeness = measure_soil_likeness(buffer);
    let fraction = likeness.fraction();
    if !likeness.is_soil() {
        debug!(
            soil_like = likeness.soil_like,
            total = likeness.total,
            fraction,
            "Image rejected by soil-likeness check"
        );
        return Err(AnalysisError::NotSoilImage {
            soil_fraction: fraction,
        });
    }

    let characteristics = reduce_characteristics(buffer);
    debug!(
        fraction,
        redness = characteristics.redness,
        organic_matter = characteristics.organic_matter,
        moisture = characteristics.moisture,
        texture = characteristics.texture,
        "Soil characteristics extracted"
    );
    Ok(characteristics)
}

/// Single pass reduction. Assumes a non-empty buffer.
fn reduce_characteristics(buffer: &PixelBuffer) -> SoilCharacteristics {
    let mut red_intensity = 0.0f64;
    let mut dark_matter = 0.0f64;
    let mut blue_values = 0.0f64;
    let mut color_variance = 0.0f64;
    let mut previous: Option<[u8; 3]> = None;

    for [r, g, b, _] in buffer.pixels() {
        let (rf, gf, bf) = (r as f64, g as f64, b as f64);

        if r > g && r > b {
            red_intensity += rf / 255.0;
        }

        let brightness = (rf + gf + bf) / 3.0;
        if brightness < DARK_BRIGHTNESS {
            dark_matter += 1.0;
        }

        if b > r && b > g {
            blue_values += bf / 255.0;
        }

        if let Some([pr, pg, pb]) = previous {
            let previous_mean = (pr as f64 + pg as f64 + pb as f64) / 3.0;
            color_variance += (brightness - previous_mean).abs();
        }
        previous = Some([r, g, b]);
    }

    let n = buffer.pixel_count() as f64;
    SoilCharacteristics {
        redness: saturate(red_intensity / n),
        organic_matter: saturate(dark_matter / n),
        moisture: saturate(blue_values / n),
        texture: saturate(color_variance / (n * 255.0)),
    }
}

fn saturate(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
