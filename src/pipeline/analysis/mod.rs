pub mod types;
pub mod catalog;
pub mod decode;
pub mod extractor;
pub mod synthesizer;
pub mod classifier;
pub mod recommendation;
pub mod variation;
pub mod orchestrator;

pub use types::*;
pub use catalog::*;
pub use decode::*;
pub use extractor::*;
pub use synthesizer::*;
pub use classifier::*;
pub use recommendation::*;
pub use variation::*;
pub use orchestrator::*;

use thiserror::Error;

/// User-facing message for images that fail the soil-likeness gate.
pub const NOT_SOIL_MESSAGE: &str =
    "The uploaded image does not appear to be a soil sample. Please upload a clear image of soil.";

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Image decoding failed: {0}")]
    Decode(String),

    #[error("{}", NOT_SOIL_MESSAGE)]
    NotSoilImage { soil_fraction: f64 },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid nutrient catalog: {0}")]
    Catalog(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
