use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use std::sync::Arc;

use super::artifact::{audio_headers, header_value};
use crate::{
    domain::{
        job::{Job, JobSource},
        tts::{dto::TtsRequest, CancelToken, ConversionService, ConversionServiceApi},
    },
    error::{AppError, AppResult},
    infrastructure::auth::ApiCredential,
};

const DEFAULT_NAME: &str = "speech";

pub struct TtsController {
    conversion: Arc<ConversionService>,
}

impl TtsController {
    pub fn new(conversion: Arc<ConversionService>) -> Self {
        Self { conversion }
    }

    /// POST /api/tts/synthesize - Convert text to speech in one request
    pub async fn synthesize(
        State(controller): State<Arc<TtsController>>,
        Extension(credential): Extension<ApiCredential>,
        Json(request): Json<TtsRequest>,
    ) -> AppResult<(StatusCode, HeaderMap, Body)> {
        let name = request.name.as_deref().unwrap_or(DEFAULT_NAME);
        let mut job = Job::new(name, JobSource::RawText, request.text);
        let voice = controller
            .conversion
            .resolve_voice(job.text(), request.voice.as_deref());

        controller
            .conversion
            .convert(
                &mut job,
                credential.as_deref(),
                &voice,
                &CancelToken::new(),
                &mut |percent| tracing::trace!(progress = percent, "Synthesis progress"),
            )
            .await?;

        let job_id = job.id();
        let chunk_count = job.chunk_count().unwrap_or(0);
        // The handle is dropped on return, so the audio does not outlive the response
        let handle = job.into_outcome()?;
        let artifact = handle
            .artifact()
            .ok_or_else(|| AppError::Internal("artifact vanished before download".to_string()))?;

        let mut headers = audio_headers(artifact.content_type, &artifact.filename)?;
        headers.insert("X-Job-Id", header_value(&job_id.to_string())?);
        headers.insert("X-Chunk-Count", header_value(&chunk_count.to_string())?);
        headers.insert("X-Voice-Used", header_value(&voice)?);

        Ok((StatusCode::OK, headers, Body::from(artifact.bytes.clone())))
    }
}
