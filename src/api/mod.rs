//! HTTP API for the research agent.
//!
//! ## Endpoints
//!
//! - `POST /chat` - Run the agent and return the final answer
//! - `POST /chat/stream` - Run the agent and stream the answer as SSE
//! - `GET /health` - Liveness check
//! - `GET /models` - Available model profiles

mod chat;
mod routes;
pub mod types;

use std::sync::Arc;

use crate::agent::Agent;
use crate::config::Config;

pub use routes::{router, AppState};

/// Start the HTTP server and run until ctrl-c.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let agent = Arc::new(Agent::new(&config));
    let state = Arc::new(AppState { agent });
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
