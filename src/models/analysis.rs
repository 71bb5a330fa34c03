use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{NutrientGroup, NutrientStatus};
use crate::pipeline::analysis::{AnalysisError, SoilCharacteristics};

/// A single classified measurement for one tracked nutrient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientReading {
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub status: NutrientStatus,
    pub recommendation: String,
}

/// Where the sample was taken, in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoLocation {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, AnalysisError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(AnalysisError::Validation(format!(
                "Latitude {latitude} is outside [-90, 90]"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(AnalysisError::Validation(format!(
                "Longitude {longitude} is outside [-180, 180]"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Complete soil-health report produced by one successful analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoilAnalysis {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub characteristics: SoilCharacteristics,
    pub primary_nutrients: Vec<NutrientReading>,
    pub secondary_nutrients: Vec<NutrientReading>,
    pub trace_elements: Vec<NutrientReading>,
    pub physical_properties: Vec<NutrientReading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoLocation>,
}

impl SoilAnalysis {
    pub fn readings(&self, group: NutrientGroup) -> &[NutrientReading] {
        match group {
            NutrientGroup::Primary => &self.primary_nutrients,
            NutrientGroup::Secondary => &self.secondary_nutrients,
            NutrientGroup::Trace => &self.trace_elements,
            NutrientGroup::Physical => &self.physical_properties,
        }
    }

    pub(crate) fn readings_mut(&mut self, group: NutrientGroup) -> &mut Vec<NutrientReading> {
        match group {
            NutrientGroup::Primary => &mut self.primary_nutrients,
            NutrientGroup::Secondary => &mut self.secondary_nutrients,
            NutrientGroup::Trace => &mut self.trace_elements,
            NutrientGroup::Physical => &mut self.physical_properties,
        }
    }

    /// All readings in report order, tagged with their group.
    pub fn all_readings(&self) -> impl Iterator<Item = (NutrientGroup, &NutrientReading)> + '_ {
        NutrientGroup::ALL
            .into_iter()
            .flat_map(move |group| self.readings(group).iter().map(move |r| (group, r)))
    }

    /// First reading with the given name, in any group.
    pub fn find_reading(&self, name: &str) -> Option<&NutrientReading> {
        self.all_readings()
            .map(|(_, r)| r)
            .find(|r| r.name == name)
    }

    /// Attach a sample location to a freshly produced report.
    pub fn with_location(mut self, location: Option<GeoLocation>) -> Self {
        self.location = location;
        self
    }

    /// First eight characters of the id, for list views.
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }
}

/// Compact history entry: identity, date and the primary nutrients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub id: Uuid,
    pub short_id: String,
    pub date: DateTime<Utc>,
    pub key_findings: Vec<NutrientReading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoLocation>,
}

impl From<&SoilAnalysis> for AnalysisSummary {
    fn from(analysis: &SoilAnalysis) -> Self {
        Self {
            id: analysis.id,
            short_id: analysis.short_id(),
            date: analysis.date,
            key_findings: analysis.primary_nutrients.clone(),
            location: analysis.location,
        }
    }
}
