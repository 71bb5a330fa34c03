use crate::models::NutrientStatus;

/// Lower and upper bounds (percent of optimum) of the good band.
const GOOD_BAND: (f64, f64) = (80.0, 120.0);
/// Lower and upper bounds of the warning band, which contains the good band.
const WARNING_BAND: (f64, f64) = (60.0, 140.0);

/// Classify a reading by its percentage of the optimum. `optimal` must be non-zero.
pub fn classify(value: f64, optimal: f64) -> NutrientStatus {
    let percentage = (value / optimal) * 100.0;
    if (GOOD_BAND.0..=GOOD_BAND.1).contains(&percentage) {
        NutrientStatus::Good
    } else if (WARNING_BAND.0..=WARNING_BAND.1).contains(&percentage) {
        NutrientStatus::Warning
    } else {
        NutrientStatus::Critical
    }
}
