pub mod api;
pub mod config;
pub mod core_state;
pub mod crops;
pub mod db;
pub mod models;
pub mod pipeline;
pub mod report;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::api::ServerError;
use crate::config::ServerSettings;
use crate::core_state::CoreState;

/// Start the HTTP server and serve until Ctrl-C.
pub async fn run() -> Result<(), ServerError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let settings = ServerSettings::from_env()?;
    let core = Arc::new(CoreState::open(&settings)?);

    let mut server = api::start_server_on(core, settings.bind, settings.max_upload_bytes).await?;
    tracing::info!(addr = %server.addr, "Listening");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Ctrl-C received, shutting down");

    server.shutdown();
    server.stopped().await;
    Ok(())
}
