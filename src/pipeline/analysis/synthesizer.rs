use super::catalog::NutrientSpec;
use super::types::SoilCharacteristics;

/// Product of `1 + (value - 0.5) * weight` over the nutrient's weight table.
///
/// Characteristics missing from the table contribute nothing. A characteristic
/// at the neutral point 0.5 contributes a factor of exactly 1.
pub fn weight_multiplier(spec: &NutrientSpec, characteristics: &SoilCharacteristics) -> f64 {
    spec.weights
        .iter()
        .map(|(c, w)| 1.0 + (characteristics.get(*c) - 0.5) * w)
        .product()
}

/// Synthetic reading for one nutrient, rounded to a whole unit.
pub fn synthesize(spec: &NutrientSpec, characteristics: &SoilCharacteristics) -> f64 {
    synthesize_scaled(spec, characteristics, 1.0)
}

/// As [`synthesize`], with an extra multiplicative factor applied before rounding.
pub fn synthesize_scaled(
    spec: &NutrientSpec,
    characteristics: &SoilCharacteristics,
    factor: f64,
) -> f64 {
    let raw = spec.base_value * weight_multiplier(spec, characteristics) * factor;
    floor_at_zero(raw.round())
}

// Strongly negative weights can push the multiplier below zero.
fn floor_at_zero(value: f64) -> f64 {
    if value <= 0.0 {
        0.0
    } else {
        value
    }
}
