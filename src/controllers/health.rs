use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::domain::audio::ArtifactStore;
use crate::infrastructure::config::Config;

pub struct Readiness {
    config: Arc<Config>,
    artifacts: ArtifactStore,
}

impl Readiness {
    pub fn new(config: Arc<Config>, artifacts: ArtifactStore) -> Self {
        Self { config, artifacts }
    }
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn health_ready(State(readiness): State<Arc<Readiness>>) -> impl IntoResponse {
    let credential = if readiness.config.openai_api_key.is_some() {
        "configured"
    } else {
        "per_request"
    };

    (
        StatusCode::OK,
        Json(json!({
            "status": "ready",
            "tts": "available",
            "model": readiness.config.tts_model,
            "credential": credential,
            "artifacts": readiness.artifacts.len(),
        })),
    )
}
