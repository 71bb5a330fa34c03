//! Analysis orchestration: decoded pixels to a complete soil-health report.
//!
//! `SoilAnalyzer` runs the extractor once, then the synthesize, classify and
//! recommend chain for every catalog entry in group order. Collaborators
//! (decoder, clock, id source) are injected so tests can pin them.

use std::sync::Arc;

use tracing::info;

use super::catalog::{NutrientCatalog, NutrientSpec};
use super::classifier::classify;
use super::decode::RasterDecoder;
use super::extractor::extract;
use super::recommendation::recommend;
use super::synthesizer::synthesize_scaled;
use super::types::{
    Clock, IdGenerator, ImageDecoder, PixelBuffer, SoilCharacteristics, SystemClock,
    UuidGenerator,
};
use super::variation::{Variation, VariationFactors};
use super::AnalysisError;
use crate::models::{NutrientGroup, NutrientReading, SoilAnalysis};

pub struct SoilAnalyzer {
    catalog: Arc<NutrientCatalog>,
    decoder: Box<dyn ImageDecoder>,
    clock: Box<dyn Clock>,
    ids: Box<dyn IdGenerator>,
    variation: Option<Variation>,
}

impl SoilAnalyzer {
    /// Analyzer with production collaborators and no variation.
    pub fn new(catalog: Arc<NutrientCatalog>) -> Self {
        Self {
            catalog,
            decoder: Box::new(RasterDecoder::default()),
            clock: Box::new(SystemClock),
            ids: Box::new(UuidGenerator),
            variation: None,
        }
    }

    pub fn with_decoder(mut self, decoder: Box<dyn ImageDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_id_generator(mut self, ids: Box<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Enable seeded variation of readings. `None` keeps reports deterministic.
    pub fn with_variation(mut self, variation: Option<Variation>) -> Self {
        self.variation = variation;
        self
    }

    pub fn catalog(&self) -> &NutrientCatalog {
        &self.catalog
    }

    /// Decode an uploaded file and analyze it.
    pub fn analyze_image(&self, bytes: &[u8]) -> Result<SoilAnalysis, AnalysisError> {
        let buffer = self.decoder.decode(bytes)?;
        self.analyze(&buffer)
    }

    /// Analyze already-decoded pixels.
    pub fn analyze(&self, buffer: &PixelBuffer) -> Result<SoilAnalysis, AnalysisError> {
        let characteristics = extract(buffer)?;
        let mut factors = self.variation.as_ref().map(Variation::factors);

        let mut analysis = SoilAnalysis {
            id: self.ids.next_id(),
            date: self.clock.now(),
            characteristics,
            primary_nutrients: Vec::new(),
            secondary_nutrients: Vec::new(),
            trace_elements: Vec::new(),
            physical_properties: Vec::new(),
            location: None,
        };

        for group in NutrientGroup::ALL {
            let readings: Vec<NutrientReading> = self
                .catalog
                .specs(group)
                .iter()
                .map(|spec| build_reading(spec, &characteristics, factors.as_mut()))
                .collect();
            *analysis.readings_mut(group) = readings;
        }

        info!(
            analysis_id = %analysis.id,
            pixels = buffer.pixel_count(),
            readings = self.catalog.len(),
            varied = self.variation.is_some(),
            "Soil analysis complete"
        );
        Ok(analysis)
    }
}

fn build_reading(
    spec: &NutrientSpec,
    characteristics: &SoilCharacteristics,
    factors: Option<&mut VariationFactors>,
) -> NutrientReading {
    let factor = factors.map_or(1.0, VariationFactors::next_factor);
    let value = synthesize_scaled(spec, characteristics, factor);
    let status = classify(value, spec.optimal);
    NutrientReading {
        name: spec.name.clone(),
        value,
        unit: spec.unit.clone(),
        status,
        recommendation: recommend(&spec.name, status),
    }
}
