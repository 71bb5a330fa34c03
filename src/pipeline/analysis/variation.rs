//! Optional seeded variation of synthesized readings.
//!
//! Off by default. When enabled, every reading is scaled by a factor drawn
//! uniformly from `[1 - spread, 1 + spread]`. The generator is seeded per
//! analysis, so the same image and seed always yield the same report.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::AnalysisError;

/// Spread used by the legacy jittered reports (factor 0.8 to 1.2).
pub const DEFAULT_SPREAD: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Variation {
    pub seed: u64,
    pub spread: f64,
}

impl Variation {
    pub fn new(seed: u64, spread: f64) -> Result<Self, AnalysisError> {
        if !spread.is_finite() || !(0.0..1.0).contains(&spread) {
            return Err(AnalysisError::Validation(format!(
                "Variation spread must lie in [0, 1), got {spread}"
            )));
        }
        Ok(Self { seed, spread })
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            spread: DEFAULT_SPREAD,
        }
    }

    /// Fresh factor stream for one analysis.
    pub fn factors(&self) -> VariationFactors {
        VariationFactors {
            rng: StdRng::seed_from_u64(self.seed),
            spread: self.spread,
        }
    }
}

pub struct VariationFactors {
    rng: StdRng,
    spread: f64,
}

impl VariationFactors {
    pub fn next_factor(&mut self) -> f64 {
        if self.spread == 0.0 {
            return 1.0;
        }
        1.0 + self.rng.gen_range(-self.spread..=self.spread)
    }
}
