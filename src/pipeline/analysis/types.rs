use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AnalysisError;

/// Decoded RGBA pixels, row-major, four bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw RGBA bytes. The byte length must match `width * height * 4`.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, AnalysisError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(AnalysisError::Validation(format!(
                "Pixel data holds {} bytes, expected {expected} for {width}x{height} RGBA",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Buffer where every pixel has the same RGBA value.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        let mut data = Vec::with_capacity(count * 4);
        for _ in 0..count {
            data.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Build a single-row buffer from a pixel list.
    pub fn from_pixels(pixels: &[[u8; 4]]) -> Self {
        let data = pixels.iter().flat_map(|p| p.iter().copied()).collect();
        Self {
            width: pixels.len() as u32,
            height: if pixels.is_empty() { 0 } else { 1 },
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.data.len() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate pixels as `[r, g, b, a]` in scan order.
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 4]> + '_ {
        self.data
            .chunks_exact(4)
            .map(|px| [px[0], px[1], px[2], px[3]])
    }
}

/// One of the four scalar soil characteristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Characteristic {
    Redness,
    OrganicMatter,
    Moisture,
    Texture,
}

impl Characteristic {
    pub const ALL: [Characteristic; 4] = [
        Characteristic::Redness,
        Characteristic::OrganicMatter,
        Characteristic::Moisture,
        Characteristic::Texture,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Redness => "redness",
            Self::OrganicMatter => "organicMatter",
            Self::Moisture => "moisture",
            Self::Texture => "texture",
        }
    }
}

/// Visual summary of a soil image. Every field lies in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoilCharacteristics {
    pub redness: f64,
    pub organic_matter: f64,
    pub moisture: f64,
    pub texture: f64,
}

impl SoilCharacteristics {
    /// Neutral point: every weight factor evaluates to 1.
    pub fn neutral() -> Self {
        Self {
            redness: 0.5,
            organic_matter: 0.5,
            moisture: 0.5,
            texture: 0.5,
        }
    }

    pub fn get(&self, characteristic: Characteristic) -> f64 {
        match characteristic {
            Characteristic::Redness => self.redness,
            Characteristic::OrganicMatter => self.organic_matter,
            Characteristic::Moisture => self.moisture,
            Characteristic::Texture => self.texture,
        }
    }
}

/// Supplies the decoded pixels for an uploaded file.
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<PixelBuffer, AnalysisError>;
}

/// Timestamp source for new analyses.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Identifier source for new analyses. Ids must never repeat within a process.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> Uuid;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Random v4 UUIDs.
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}
