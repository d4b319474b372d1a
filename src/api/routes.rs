//! Router and shared state.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::chat;
use super::types::{HealthResponse, ModelInfo};
use crate::agent::Agent;

pub const AGENT_NAME: &str = "Deep Research";

/// Immutable state shared by all requests.
pub struct AppState {
    pub agent: Arc<Agent>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/chat", post(chat::chat))
        .route("/chat/stream", post(chat::chat_stream))
        .route("/health", get(health))
        .route("/models", get(list_models))
        // Development default: any origin, method and header.
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        agent: AGENT_NAME.to_string(),
    })
}

async fn list_models(State(state): State<Arc<AppState>>) -> Json<Vec<ModelInfo>> {
    let models = state
        .agent
        .profiles()
        .iter()
        .map(|p| ModelInfo {
            profile: p.name.clone(),
            name: p.display_name.clone(),
            description: p.description.clone(),
        })
        .collect();
    Json(models)
}
