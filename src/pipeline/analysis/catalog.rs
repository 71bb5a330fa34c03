//! Nutrient catalog: which nutrients a report tracks, grouped into the four
//! report sections, with each nutrient's base value, optimum and weight table.
//!
//! The catalog is configuration, not behavior. It is built once at startup
//! (either the built-in table or a JSON file), validated, and shared read-only.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::types::Characteristic;
use super::AnalysisError;
use crate::models::NutrientGroup;

/// Static description of one tracked nutrient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientSpec {
    pub name: String,
    pub unit: String,
    pub base_value: f64,
    pub optimal: f64,
    /// Signed sensitivity of this nutrient to each characteristic.
    /// Characteristics absent from the map do not affect the reading.
    #[serde(default)]
    pub weights: BTreeMap<Characteristic, f64>,
}

impl NutrientSpec {
    /// Spec whose optimum equals its base value.
    pub fn new(name: &str, unit: &str, base_value: f64) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            base_value,
            optimal: base_value,
            weights: BTreeMap::new(),
        }
    }

    pub fn with_weight(mut self, characteristic: Characteristic, weight: f64) -> Self {
        self.weights.insert(characteristic, weight);
        self
    }

    fn validate(&self, group: NutrientGroup) -> Result<(), AnalysisError> {
        if self.name.trim().is_empty() {
            return Err(AnalysisError::Catalog(format!(
                "{} entry has an empty name",
                group.as_str()
            )));
        }
        if !self.base_value.is_finite() {
            return Err(AnalysisError::Catalog(format!(
                "{}: base value must be finite",
                self.name
            )));
        }
        if !self.optimal.is_finite() || self.optimal <= 0.0 {
            return Err(AnalysisError::Catalog(format!(
                "{}: optimal must be a positive number, got {}",
                self.name, self.optimal
            )));
        }
        if let Some((c, w)) = self.weights.iter().find(|(_, w)| !w.is_finite()) {
            return Err(AnalysisError::Catalog(format!(
                "{}: weight for {} must be finite, got {w}",
                self.name,
                c.as_str()
            )));
        }
        Ok(())
    }
}

/// Tracked nutrients, in report order within each group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientCatalog {
    #[serde(default)]
    pub primary: Vec<NutrientSpec>,
    #[serde(default)]
    pub secondary: Vec<NutrientSpec>,
    #[serde(default)]
    pub trace: Vec<NutrientSpec>,
    #[serde(default)]
    pub physical: Vec<NutrientSpec>,
}

impl Default for NutrientCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl NutrientCatalog {
    /// Built-in catalog: NPK, secondary macronutrients, four trace elements and pH.
    pub fn standard() -> Self {
        use Characteristic::*;

        Self {
            primary: vec![
                NutrientSpec::new("Nitrogen (N)", "mg/kg", 45.0)
                    .with_weight(OrganicMatter, 1.2)
                    .with_weight(Moisture, 0.8),
                NutrientSpec::new("Phosphorus (P)", "mg/kg", 15.0)
                    .with_weight(Redness, 0.9)
                    .with_weight(OrganicMatter, 0.6),
                NutrientSpec::new("Potassium (K)", "mg/kg", 235.0)
                    .with_weight(Texture, 0.7)
                    .with_weight(Moisture, 0.5),
            ],
            secondary: vec![
                NutrientSpec::new("Calcium (Ca)", "mg/kg", 2100.0)
                    .with_weight(Texture, 0.4)
                    .with_weight(Redness, 0.3),
                NutrientSpec::new("Magnesium (Mg)", "mg/kg", 180.0)
                    .with_weight(OrganicMatter, 0.5)
                    .with_weight(Moisture, 0.4),
                NutrientSpec::new("Sulfur (S)", "mg/kg", 12.0)
                    .with_weight(OrganicMatter, 0.8)
                    .with_weight(Moisture, 0.6),
            ],
            trace: vec![
                NutrientSpec::new("Iron (Fe)", "mg/kg", 85.0)
                    .with_weight(Redness, 1.2)
                    .with_weight(Texture, 0.4),
                NutrientSpec::new("Manganese (Mn)", "mg/kg", 45.0)
                    .with_weight(OrganicMatter, 0.9)
                    .with_weight(Moisture, 0.5),
                NutrientSpec::new("Copper (Cu)", "mg/kg", 12.0)
                    .with_weight(OrganicMatter, 0.7)
                    .with_weight(Texture, 0.6),
                NutrientSpec::new("Zinc (Zn)", "mg/kg", 25.0)
                    .with_weight(Texture, 0.8)
                    .with_weight(Moisture, 0.4),
            ],
            physical: vec![NutrientSpec::new("pH Level", "pH", 6.8)
                .with_weight(Moisture, 0.6)
                .with_weight(OrganicMatter, 0.4)],
        }
    }

    /// Parse and validate a catalog from JSON.
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let catalog: Self = serde_json::from_str(json)
            .map_err(|e| AnalysisError::Catalog(format!("Malformed catalog JSON: {e}")))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Read a catalog file.
    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Read the catalog file if present, otherwise fall back to [`NutrientCatalog::standard`].
    /// A file that exists but fails to parse is an error, not a silent fallback.
    pub fn load_or_standard(path: &Path) -> Result<Self, AnalysisError> {
        if path.exists() {
            tracing::info!(path = %path.display(), "Loading nutrient catalog");
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "No catalog file, using built-in catalog");
            Ok(Self::standard())
        }
    }

    pub fn specs(&self, group: NutrientGroup) -> &[NutrientSpec] {
        match group {
            NutrientGroup::Primary => &self.primary,
            NutrientGroup::Secondary => &self.secondary,
            NutrientGroup::Trace => &self.trace,
            NutrientGroup::Physical => &self.physical,
        }
    }

    pub fn len(&self) -> usize {
        NutrientGroup::ALL.iter().map(|g| self.specs(*g).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reject entries that would make classification undefined.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.is_empty() {
            return Err(AnalysisError::Catalog("catalog tracks no nutrients".into()));
        }
        for group in NutrientGroup::ALL {
            for spec in self.specs(group) {
                spec.validate(group)?;
            }
        }
        Ok(())
    }
}
