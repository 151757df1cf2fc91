use axum::{Json, Router, extract::State, routing::{get, post}};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    error::ApiError,
    models::{GenerateRequest, GenerationResult, HealthResponse, Kit, Mode},
    orchestrator::Generator,
    store::KitStore,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn KitStore>,
    pub generator: Generator,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/kits", get(list_kits))
        .route("/api/generate", post(generate_instructions))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let mongodb = state.store.health().await;
    Json(HealthResponse { status: "ok".to_string(), mongodb: mongodb.as_str().to_string() })
}

pub async fn list_kits(State(state): State<AppState>) -> Result<Json<Vec<Kit>>, ApiError> {
    let kits = state.store.list().await?;
    tracing::info!("📦 Listing {} kits", kits.len());
    Ok(Json(kits))
}

pub async fn generate_instructions(
    State(state): State<AppState>,
    Json(body): Json<GenerateRequest>,
) -> Result<Json<GenerationResult>, ApiError> {
    let mode = match body.mode { Mode::Build => "build", Mode::Reverse => "reverse" };
    tracing::info!("🚀 Generate request: mode={} kits={}", mode, body.kits.len());
    let result = state.generator.generate(&body).await?;
    tracing::info!("✅ Generated with {} ({} steps)", result.model_used, result.steps.len());
    Ok(Json(result))
}
