use std::net::SocketAddr;
use std::path::PathBuf;

use crate::pipeline::analysis::{
    DecoderConfig, Variation, DEFAULT_MAX_DIMENSION, DEFAULT_MAX_UPLOAD_BYTES,
};

/// Application-level constants
pub const APP_NAME: &str = "SoilSense";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the application data directory
/// ~/SoilSense/ on all platforms, or ./SoilSense when no home directory is known
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// History database location
pub fn database_path() -> PathBuf {
    app_data_dir().join("history.db")
}

/// Optional nutrient catalog override
pub fn catalog_path() -> PathBuf {
    app_data_dir().join("catalog.json")
}

/// Log filter used when `RUST_LOG` is unset
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "soilsense=debug,tower_http=debug,info"
    } else {
        "soilsense=info,tower_http=info,warn"
    }
}

/// Runtime settings for the HTTP server, read from `SOILSENSE_*` variables.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub bind: SocketAddr,
    pub database_path: PathBuf,
    pub catalog_path: PathBuf,
    pub max_upload_bytes: usize,
    pub max_dimension: u32,
    /// Seed for reading variation. Unset keeps reports deterministic.
    pub variation_seed: Option<u64>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            database_path: database_path(),
            catalog_path: catalog_path(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_dimension: DEFAULT_MAX_DIMENSION,
            variation_seed: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid value for {var}: {value:?} ({reason})")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

impl ServerSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(v) = lookup("SOILSENSE_BIND") {
            settings.bind = parse_var("SOILSENSE_BIND", &v)?;
        }
        if let Some(v) = lookup("SOILSENSE_DB") {
            settings.database_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("SOILSENSE_CATALOG") {
            settings.catalog_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("SOILSENSE_MAX_UPLOAD_BYTES") {
            settings.max_upload_bytes = parse_var("SOILSENSE_MAX_UPLOAD_BYTES", &v)?;
        }
        if let Some(v) = lookup("SOILSENSE_MAX_DIMENSION") {
            settings.max_dimension = parse_var("SOILSENSE_MAX_DIMENSION", &v)?;
        }
        if let Some(v) = lookup("SOILSENSE_VARIATION_SEED") {
            settings.variation_seed = Some(parse_var("SOILSENSE_VARIATION_SEED", &v)?);
        }

        Ok(settings)
    }

    pub fn decoder_config(&self) -> DecoderConfig {
        DecoderConfig {
            max_bytes: self.max_upload_bytes,
            max_dimension: self.max_dimension,
            ..DecoderConfig::default()
        }
    }

    pub fn variation(&self) -> Option<Variation> {
        self.variation_seed.map(Variation::with_seed)
    }
}

fn parse_var<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
