//! Shared application state for the HTTP layer.
//!
//! `CoreState` owns the configured analyzer and the history database
//! connection. It is wrapped in `Arc` at startup and handed to every
//! request handler. Decode and analysis run on the blocking pool; history
//! reads lock the connection directly from the handler.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::config::ServerSettings;
use crate::db;
use crate::models::{GeoLocation, SoilAnalysis};
use crate::pipeline::analysis::{AnalysisError, NutrientCatalog, RasterDecoder, SoilAnalyzer};

pub struct CoreState {
    analyzer: SoilAnalyzer,
    /// History store. Single connection, serialized by the mutex.
    db: Mutex<Connection>,
}

impl CoreState {
    /// Production state: catalog from disk (or built-in), database at the configured path.
    pub fn open(settings: &ServerSettings) -> Result<Self, CoreError> {
        let catalog = NutrientCatalog::load_or_standard(&settings.catalog_path)?;
        tracing::info!(
            path = %settings.catalog_path.display(),
            nutrients = catalog.len(),
            "Nutrient catalog ready"
        );

        let analyzer = SoilAnalyzer::new(Arc::new(catalog))
            .with_decoder(Box::new(RasterDecoder::new(settings.decoder_config())))
            .with_variation(settings.variation());

        let conn = db::open_database(&settings.database_path)?;
        tracing::info!(path = %settings.database_path.display(), "History database open");

        Ok(Self::new(analyzer, conn))
    }

    pub fn new(analyzer: SoilAnalyzer, conn: Connection) -> Self {
        Self {
            analyzer,
            db: Mutex::new(conn),
        }
    }

    /// In-memory history with the given analyzer (tests and ephemeral runs).
    pub fn in_memory(analyzer: SoilAnalyzer) -> Result<Self, CoreError> {
        Ok(Self::new(analyzer, db::open_memory_database()?))
    }

    pub fn analyzer(&self) -> &SoilAnalyzer {
        &self.analyzer
    }

    pub fn lock_db(&self) -> Result<MutexGuard<'_, Connection>, CoreError> {
        self.db.lock().map_err(|_| CoreError::LockPoisoned)
    }

    /// Analyze an uploaded image and record the report in history.
    pub fn analyze_and_store(
        &self,
        bytes: &[u8],
        location: Option<GeoLocation>,
    ) -> Result<SoilAnalysis, CoreError> {
        let analysis = self.analyzer.analyze_image(bytes)?.with_location(location);
        let conn = self.lock_db()?;
        db::insert_analysis(&conn, &analysis)?;
        Ok(analysis)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}
