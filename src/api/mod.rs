//! HTTP API.
//!
//! Exposes analysis, history, report export and crop suggestions as JSON
//! endpoints under `/api/`. The router is composable: `api_router()`
//! returns a `Router` that can be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::api_router;
pub use server::{start_server_on, ApiServer, ServerError};
pub use types::ApiContext;
