//! API server lifecycle: bind, spawn the axum server in a background
//! task, and hand back a handle with a shutdown channel.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::api::router::api_router;
use crate::config::ConfigError;
use crate::core_state::{CoreError, CoreState};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Startup failed: {0}")]
    Core(#[from] CoreError),
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle to a running API server.
pub struct ApiServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ApiServer {
    /// Signal the server to finish in-flight requests and stop.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }

    /// Wait for the server task to exit.
    pub async fn stopped(self) {
        if let Err(e) = self.task.await {
            tracing::error!("API server task failed: {e}");
        }
    }
}

/// Start the API server on `addr`. Port 0 picks an ephemeral port.
pub async fn start_server_on(
    core: Arc<CoreState>,
    addr: SocketAddr,
    max_upload_bytes: usize,
) -> Result<ApiServer, ServerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    let addr = listener.local_addr()?;

    let app = api_router(core, max_upload_bytes);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        tracing::info!(%addr, "API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("API server error: {e}");
        }

        tracing::info!("API server stopped");
    });

    Ok(ApiServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use base64::Engine;

    use super::*;
    use crate::pipeline::analysis::decode::test_support::png_bytes;
    use crate::pipeline::analysis::{NutrientCatalog, SoilAnalyzer};

    fn test_core() -> Arc<CoreState> {
        let analyzer = SoilAnalyzer::new(Arc::new(NutrientCatalog::standard()));
        Arc::new(CoreState::in_memory(analyzer).unwrap())
    }

    async fn start() -> ApiServer {
        start_server_on(
            test_core(),
            SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
            5 * 1024 * 1024,
        )
        .await
        .expect("server should start")
    }

    #[tokio::test]
    async fn start_and_stop_server() {
        let mut server = start().await;
        assert!(server.addr.port() > 0);

        let url = format!("http://{}/api/health", server.addr);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");

        server.shutdown();
        server.stopped().await;
    }

    #[tokio::test]
    async fn analyze_over_http() {
        let mut server = start().await;
        let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes(8, 8, [120, 80, 30]));

        let client = reqwest::Client::new();
        let resp = client
            .post(format!("http://{}/api/analyze/data-url", server.addr))
            .json(&serde_json::json!({ "data": format!("data:image/png;base64,{encoded}") }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::CREATED);
        let analysis: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(analysis["primaryNutrients"][0]["name"], "Nitrogen (N)");

        server.shutdown();
        server.stopped().await;
    }

    #[tokio::test]
    async fn bind_conflict_is_reported() {
        let mut server = start().await;
        let err = start_server_on(test_core(), server.addr, 1024)
            .await
            .err()
            .expect("second bind should fail");
        assert!(matches!(err, ServerError::Bind { .. }));
        server.shutdown();
    }
}
