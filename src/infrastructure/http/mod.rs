use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::controllers::{
    artifact::ArtifactController,
    batch::BatchController,
    health::{self, Readiness},
    tts::TtsController,
};
use crate::domain::{
    audio::{ArtifactStore, AudioAssembler},
    ingestion::FileIngestion,
    tts::{BatchService, ConversionService, Segmenter},
};
use crate::infrastructure::{
    auth::{credential_middleware, request_id_middleware},
    config::Config,
    repositories::{BatchRepository, SpeechRepository},
};

/// Uploaded files travel inside the JSON body; leave room for several at the limit
const FILES_PER_BODY: usize = 8;

/// Wire services and controllers around a speech backend and build the router
pub fn build_app(config: Arc<Config>, speech_repo: Arc<dyn SpeechRepository>) -> Router {
    // === DEPENDENCY INJECTION SETUP ===
    let artifacts = ArtifactStore::new();
    let batch_repo = BatchRepository::new(config.batch_ttl());

    let conversion_service = Arc::new(ConversionService::new(
        speech_repo,
        artifacts.clone(),
        Segmenter::new(config.max_chunk_size, config.segment_policy),
        AudioAssembler::new(config.merge_policy),
        config.tts_default_voice.clone(),
    ));
    let batch_service = Arc::new(BatchService::new(conversion_service.clone()));

    let tts_controller = Arc::new(TtsController::new(conversion_service));
    let batch_controller = Arc::new(BatchController::new(
        batch_service,
        batch_repo,
        FileIngestion::new(config.upload_max_bytes),
    ));
    let artifact_controller = Arc::new(ArtifactController::new(artifacts.clone()));
    let readiness = Arc::new(Readiness::new(config.clone(), artifacts));

    // Conversion routes (need a speech API credential)
    let tts_routes = Router::new()
        .route("/api/tts/synthesize", post(TtsController::synthesize))
        .with_state(tts_controller)
        .layer(middleware::from_fn_with_state(
            config.clone(),
            credential_middleware,
        ));

    let batch_create_routes = Router::new()
        .route("/api/batches", post(BatchController::create))
        .with_state(batch_controller.clone())
        .layer(DefaultBodyLimit::max(
            config.upload_max_bytes.saturating_mul(FILES_PER_BODY),
        ))
        .layer(middleware::from_fn_with_state(
            config.clone(),
            credential_middleware,
        ));

    // Batch inspection routes (batch ids are unguessable)
    let batch_routes = Router::new()
        .route(
            "/api/batches/:batchId",
            get(BatchController::get).delete(BatchController::delete),
        )
        .route("/api/batches/:batchId/cancel", post(BatchController::cancel))
        .with_state(batch_controller);

    let artifact_routes = Router::new()
        .route("/api/artifacts/:artifactId", get(ArtifactController::download))
        .with_state(artifact_controller);

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(readiness)
        .merge(tts_routes)
        .merge(batch_create_routes)
        .merge(batch_routes)
        .merge(artifact_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Start the HTTP server with all routes configured
pub async fn start_http_server(
    config: Arc<Config>,
    app: Router,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
