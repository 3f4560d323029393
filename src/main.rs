use std::sync::Arc;
use textcast_backend::domain::tts::progress::ByteProgressPolicy;
use textcast_backend::infrastructure::config::{Config, LogFormat};
use textcast_backend::infrastructure::http::{build_app, start_http_server};
use textcast_backend::infrastructure::repositories::OpenAiSpeechRepository;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting Textcast Backend on {}:{}",
        config.host,
        config.port
    );
    tracing::info!(
        base_url = %config.openai_base_url,
        model = %config.tts_model,
        has_api_key = config.openai_api_key.is_some(),
        max_chunk_size = config.max_chunk_size,
        segment_policy = ?config.segment_policy,
        merge_policy = ?config.merge_policy,
        "Speech pipeline configuration"
    );

    if config.openai_api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY not set. Every request must carry its own bearer credential");
    }

    let http = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()?;
    let speech_repo = Arc::new(OpenAiSpeechRepository::new(
        http,
        config.openai_base_url.clone(),
        config.tts_model.clone(),
        ByteProgressPolicy::new(config.bytes_per_char),
    ));

    let config = Arc::new(config);
    let app = build_app(config.clone(), speech_repo);

    // Start HTTP server with all routes
    start_http_server(config, app).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    let default_filter = if config.is_development() {
        "textcast_backend=debug,tower_http=debug"
    } else {
        "textcast_backend=info,tower_http=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
