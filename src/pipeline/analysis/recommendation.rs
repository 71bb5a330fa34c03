use crate::models::NutrientStatus;

/// Fixed advice template for a nutrient in the given status.
pub fn recommend(name: &str, status: NutrientStatus) -> String {
    match status {
        NutrientStatus::Good => {
            format!("{name} levels are optimal. Continue current practices.")
        }
        NutrientStatus::Warning => {
            format!("Consider supplementing {name} levels through appropriate fertilization.")
        }
        NutrientStatus::Critical => format!(
            "Urgent: {name} levels require immediate attention. Apply recommended fertilizers."
        ),
    }
}
